use provql_core::DriverError;
use provql_engine::QueryError;
use provql_types::VersionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvqlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid version: {0}")]
    Version(#[from] VersionError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
