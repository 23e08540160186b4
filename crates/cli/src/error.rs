//! Error types for the world-kpi CLI (native-only errors)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// CLI-specific error types (includes native dependencies)
#[derive(Error, Debug)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] world_kpi_core::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to load data from {url}: {message}{}", retry_suffix(.retries))]
    Fetch {
        url: String,
        message: String,
        retries: u32,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn retry_suffix(retries: &u32) -> String {
    if *retries > 0 {
        format!(" (after {} retries)", retries)
    } else {
        String::new()
    }
}
