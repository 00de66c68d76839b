pub mod app;
pub mod auth;
pub mod chat;
pub mod commands;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::{load_data, JsonFileStore};
