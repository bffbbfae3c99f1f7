use std::collections::TryReserveError;

use thiserror::Error;

/// Failures surfaced by the fallible (`try_*`) constructors and inserts.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to allocate backing array: {0}")]
    Alloc(#[from] TryReserveError),
    #[error("invalid map configuration: {0}")]
    InvalidConfig(&'static str),
}
