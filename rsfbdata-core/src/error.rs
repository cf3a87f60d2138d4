//! Error type of the crate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FbError {
    /// Error reported by the database access layer
    #[error("sql error {code}: {msg}")]
    Sql { msg: String, code: i32 },

    /// The value can't be represented as the requested type
    #[error("Error converting to {target}: {msg}")]
    TypeConversion { target: &'static str, msg: String },

    /// No converter is known for the column type
    #[error("SQL type {sqltype} (subtype {subtype}) is not supported")]
    UnsupportedType { sqltype: i16, subtype: i16 },

    #[error("column name {0} not found in result set")]
    ColumnNotFound(String),

    /// Call made in a state that does not allow it
    #[error("{0}")]
    IllegalState(String),

    /// Failure while moving blob segments
    #[error("{op} failed: {source}")]
    Streaming {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not supported")]
    UnsupportedOperation(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("error: {0}")]
    Other(String),
}

impl FbError {
    /// Conversion error for the `target` type
    pub fn conversion<M: Into<String>>(target: &'static str, msg: M) -> FbError {
        FbError::TypeConversion {
            target,
            msg: msg.into(),
        }
    }

    pub fn illegal_state<M: Into<String>>(msg: M) -> FbError {
        FbError::IllegalState(msg.into())
    }
}

impl From<String> for FbError {
    fn from(msg: String) -> Self {
        FbError::Other(msg)
    }
}

impl From<&str> for FbError {
    fn from(msg: &str) -> Self {
        FbError::Other(msg.to_string())
    }
}
