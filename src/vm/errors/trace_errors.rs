use thiserror::Error;

use crate::vm::errors::memory_errors::MemoryError;

#[derive(Debug, Error, PartialEq)]
pub enum TraceError {
    #[error("Trace has not been relocated")]
    TraceNotRelocated,
    #[error("No relocation found for the segment of a trace register")]
    NoRelocationFound,
    #[error(transparent)]
    Memory(#[from] MemoryError),
}
