//! DP Utility - Rust библиотека для анонимизации CSV и оценки приватных моделей

pub mod api;
pub mod config;
pub mod error;
pub mod mechanisms;
pub mod models;
pub mod preprocessing;
pub mod storage;
pub mod types;

// Re-export для удобства
pub use config::ServerConfig;
pub use error::ServiceError;
pub use models::*;
pub use types::*;
