use felt::Felt252;
use thiserror::Error;

use crate::types::errors::math_errors::MathError;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};

#[derive(Debug, Error, PartialEq)]
pub enum MemoryError {
    #[error("Can't insert into segment #{0}; memory only has {1} segment(s)")]
    UnallocatedSegment(usize, usize),
    #[error("Inconsistent memory assignment at address {0}. {1} != {2}")]
    InconsistentMemory(Relocatable, MaybeRelocatable, MaybeRelocatable),
    #[error("Unknown memory cell at address {0}")]
    UnknownMemoryCell(Relocatable),
    #[error("Expected a field element at address {0}")]
    ExpectedFelt(Relocatable),
    #[error("Expected a relocatable value at address {0}")]
    ExpectedRelocatable(Relocatable),
    #[error("Memory addresses must be relocatable")]
    AddressNotRelocatable,
    #[error("Address {0} lives in a temporary segment and cannot be relocated")]
    AddressInTemporarySegment(isize),
    #[error("compute_effective_sizes must be called before relocating the segments")]
    MissingSegmentUsedSizes,
    #[error("ECDSA builtin: no signature registered for public key address {0}")]
    SignatureNotFound(Relocatable),
    #[error("ECDSA builtin: signature verification failed for the instance at {0}")]
    InvalidSignature(Relocatable),
    #[error(transparent)]
    RangeCheck(#[from] RangeCheckError),
    #[error(transparent)]
    Math(#[from] MathError),
}

#[derive(Debug, Error, PartialEq)]
pub enum RangeCheckError {
    #[error("Value {0} is out of bounds [0, 2^128]")]
    OutOfBounds(Felt252),
    #[error("Value found in {0} is not a field element")]
    NotAFelt(Relocatable),
}
