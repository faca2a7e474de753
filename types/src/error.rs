//! Error type for parsing the fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
