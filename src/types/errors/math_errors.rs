use felt::Felt252;
use thiserror::Error;

use crate::types::relocatable::Relocatable;

#[derive(Debug, Error, PartialEq)]
pub enum MathError {
    #[error("Cannot add two relocatable values: {0} + {1}")]
    RelocatableAdd(Relocatable, Relocatable),
    #[error("Operation failed: {0} + {1}, maximum offset value exceeded")]
    RelocatableAddFeltOffsetExceeded(Relocatable, Felt252),
    #[error("Operation failed: {0} - {1}, offsets cannot be negative")]
    SegmentSubOffset(Relocatable, usize),
    #[error(
        "Operation failed: {0} - {1}, can only subtract two relocatable values of the same segment"
    )]
    CantSubRelocatablesDifferentSegments(Relocatable, Relocatable),
    #[error("Operation failed: {0} - {1}, cannot subtract a relocatable value from an integer")]
    SubRelocatableFromInt(Felt252, Relocatable),
    #[error("Conversion to usize failed: {0} does not fit")]
    Felt252ToUsizeConversion(Felt252),
    #[error("Conversion to u64 failed: {0} does not fit")]
    Felt252ToU64Conversion(Felt252),
    #[error("Attempted to divide by zero")]
    DividedByZero,
}
