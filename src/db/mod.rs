pub mod queries;

use anyhow::Result;
use sqlx::SqlitePool;
use std::fs;

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let url = normalize_sqlite_url(database_url);
    // Ensure the backing file exists for file-based sqlite (avoids open
    // errors on some setups).
    if let Some(path) = db_file_path(&url) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        if !path.exists() {
            fs::File::create(&path).ok();
        }
    }
    let pool = SqlitePool::connect(&url).await?;
    Ok(pool)
}

/// Apply every `.sql` script under `migrations/` in filename order. The
/// scripts only use `CREATE ... IF NOT EXISTS`, so re-running the whole set
/// at every boot is safe.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let mut scripts: Vec<std::path::PathBuf> = fs::read_dir("migrations")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("sql"))
        .collect();
    scripts.sort();
    for script in scripts {
        let sql = fs::read_to_string(&script)?;
        sqlx::query(&sql).execute(pool).await?;
        tracing::debug!(script = %script.display(), "migration applied");
    }
    Ok(())
}

fn normalize_sqlite_url(input: &str) -> String {
    // Accept forms: sqlite:foo.db (fix), sqlite://foo.db (ok), file:foo.db
    // (convert), bare path (prepend)
    if input.starts_with("sqlite://") || input.starts_with("sqlite::memory:") {
        return input.to_string();
    }
    if input.starts_with("sqlite:") {
        let rest = input.trim_start_matches("sqlite:");
        return format!("sqlite://{}", rest.trim_start_matches('/'));
    }
    if input.starts_with("file:") {
        return format!("sqlite://{}", input.trim_start_matches("file:"));
    }
    format!("sqlite://{}", input)
}

fn db_file_path(url: &str) -> Option<std::path::PathBuf> {
    if let Some(rest) = url.strip_prefix("sqlite://") {
        if rest == ":memory:" {
            return None;
        }
        return Some(std::path::PathBuf::from(rest));
    }
    None
}
