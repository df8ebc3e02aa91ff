use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Variable '{name}' is not bound")]
    UnboundVariable { name: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Operator '{operator}' failed on operand {operand}: {message}")]
    Evaluation {
        operator: String,
        operand: usize,
        message: String,
    },
}

impl QueryError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundVariable { name: name.into() }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    pub fn evaluation(
        operator: impl Into<String>,
        operand: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Evaluation {
            operator: operator.into(),
            operand,
            message: message.into(),
        }
    }

    /// Returns the name of the failing operator, if this is an evaluation error.
    pub fn operator(&self) -> Option<&str> {
        match self {
            Self::Evaluation { operator, .. } => Some(operator),
            _ => None,
        }
    }
}
