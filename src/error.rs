//! Error types for VyuhaNav

use thiserror::Error;

/// VyuhaNav error type
#[derive(Error, Debug)]
pub enum VyuhaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Maze error: {0}")]
    Maze(String),
}

impl From<toml::de::Error> for VyuhaError {
    fn from(e: toml::de::Error) -> Self {
        VyuhaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VyuhaError>;
