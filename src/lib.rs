pub mod catalog;
pub mod config;
pub mod enrich;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod stats;

/// Application name for XDG paths
pub const APP_NAME: &str = "showgap";
