use thiserror::Error;

/// Common error type for dellhw components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using dellhw's Error.
pub type Result<T> = std::result::Result<T, Error>;
