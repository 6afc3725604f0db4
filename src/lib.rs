pub mod config;
pub mod db;
pub mod mailer;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;
pub mod settings;
pub mod state;
pub mod verify;
