// Movie Ratings API - Core Library
// Exposes the store, loader and router for the server, the CLI and tests

pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod schema;
pub mod transform;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::ServerConfig;
pub use db::{MovieStore, NewMovie, Row, NEW_MOVIE_KEYS};
pub use error::ApiError;
pub use loader::{read_csv, read_csv_from_reader, Record};
pub use schema::{Column, ColumnType, TableSchema, MOVIES, RATINGS};
pub use transform::{adjustment_for, runtime_update_sql, RuntimeRule, RUNTIME_RULES};

#[cfg(feature = "server")]
pub use api::{router, serve, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
