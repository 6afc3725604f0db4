//! Operator-tunable settings persisted as a flat JSON file. The daily send
//! limit lives here so it can be changed without a restart or redeploy.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub daily_limit: i64,
}

/// Load settings from `path`. A missing or unreadable file falls back to the
/// given default limit rather than failing startup.
pub fn load(path: &str, default_daily_limit: i64) -> Settings {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or(Settings {
            daily_limit: default_daily_limit,
        }),
        Err(_) => Settings {
            daily_limit: default_daily_limit,
        },
    }
}

pub fn save(path: &str, settings: &Settings) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(settings)?)?;
    Ok(())
}

/// Current daily ceiling, re-read on every call so edits take effect between
/// send invocations.
pub fn daily_limit(path: &str, default: i64) -> i64 {
    load(path, default).daily_limit
}
