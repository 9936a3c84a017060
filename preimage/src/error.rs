use std::fmt;

/// Error types for preimage construction and solving
#[derive(Debug, Clone, PartialEq)]
pub enum PreimageError {
    /// A constructor was handed arguments that violate its invariants
    /// (zero exponent, non-positive base, reversed interval endpoints, ...)
    InvalidArgument(String),

    /// The expression does not mention exactly one free symbol
    SymbolCount {
        expression: String,
        symbols: Vec<String>,
    },

    /// The expression shape is outside the relational/boolean vocabulary
    Unsupported(String),

    /// The scalar oracle could not invert a relation into a concrete set
    NotInvertible(String),

    /// A configured limit (isolation steps, nesting depth, precision) was hit
    ResourceExhausted(String),
}

impl PreimageError {
    /// Create an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a resource-exhaustion error
    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhausted(message.into())
    }

    /// True for errors the caller can recover from by choosing another strategy
    pub fn is_unsupported_input(&self) -> bool {
        matches!(
            self,
            PreimageError::SymbolCount { .. }
                | PreimageError::Unsupported(_)
                | PreimageError::NotInvertible(_)
        )
    }
}

impl fmt::Display for PreimageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreimageError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            PreimageError::SymbolCount {
                expression,
                symbols,
            } => {
                write!(
                    f,
                    "Expression \"{}\" needs exactly one symbol, found {}",
                    expression,
                    symbols.len()
                )?;
                if !symbols.is_empty() {
                    write!(f, " ({})", symbols.join(", "))?;
                }
                Ok(())
            }
            PreimageError::Unsupported(expr) => {
                write!(f, "Expression \"{}\" has unknown type", expr)
            }
            PreimageError::NotInvertible(expr) => {
                write!(f, "Expression \"{}\" is not invertible", expr)
            }
            PreimageError::ResourceExhausted(msg) => write!(f, "Resource limit exceeded: {}", msg),
        }
    }
}

impl std::error::Error for PreimageError {}
