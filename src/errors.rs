use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MalError {
    #[error("Syntax Error: {0}")]
    Parse(#[from] pest::error::Error<crate::parser::Rule>),

    #[error("invalid if/else pairing: label \"{label}\" is already paired with \"{existing}\"")]
    InvalidIfElse { label: String, existing: String },

    #[error("duplicate label definition: {0}")]
    DuplicateLabel(String),

    #[error("infeasible layout: {reason}")]
    InfeasibleLayout { reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MalError {
    fn from(err: std::io::Error) -> Self {
        MalError::Io(err.to_string())
    }
}
