//! Error types for driver construction and execution.

use provql_engine::QueryError;
use thiserror::Error;

/// Reported by an [`ExpressionFactory`](crate::ExpressionFactory) for source
/// text it cannot compile.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to compile '{query}': {message}")]
pub struct CompileError {
    pub query: String,
    pub message: String,
}

impl CompileError {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Query(#[from] QueryError),
}
