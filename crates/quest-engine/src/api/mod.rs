pub mod config;
pub mod quest;
pub mod types;
