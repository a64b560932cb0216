// This module defines the error type for the cmmc pipeline using the thiserror crate.
// CompileError covers every way a compilation can stop: empty or malformed AST text,
// constructs the lowering deliberately does not support, calls to functions that were
// not lowered yet, reads of names that were never bound, and exhaustion of one of the
// three register pools. Each variant carries the offending name or a short reason. No
// stage recovers from any of them; the first error aborts the whole compilation and no
// partial TAC or assembly is produced. CompileResult<T> is the usual alias.

//! Error types for the cmmc compiler.

use thiserror::Error;

/// Main error type for a compilation.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("AST input is empty")]
    EmptyAst,

    #[error("Malformed AST: {reason}")]
    MalformedAst { reason: String },

    #[error("Unsupported construct: {construct}")]
    Unsupported { construct: String },

    #[error("Error: Function '{name}' undefined")]
    UndefinedFunction { name: String },

    #[error("Error: '{name}' undefined")]
    UndefinedIdentifier { name: String },

    #[error("Ran out of {pool} registers while allocating '{name}'")]
    RegisterExhausted { pool: &'static str, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CompileError::MalformedAst {
            reason: reason.into(),
        }
    }
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_culprit() {
        let err = CompileError::UndefinedFunction {
            name: "foo".to_string(),
        };
        assert_eq!(err.to_string(), "Error: Function 'foo' undefined");

        let err = CompileError::RegisterExhausted {
            pool: "temporary",
            name: "t12".to_string(),
        };
        assert!(err.to_string().contains("temporary"));
        assert!(err.to_string().contains("t12"));
    }
}
