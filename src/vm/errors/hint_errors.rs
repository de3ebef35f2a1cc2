use felt::Felt252;
use thiserror::Error;

use crate::types::errors::math_errors::MathError;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::{
    exec_scope_errors::ExecScopeError, memory_errors::MemoryError, vm_errors::VirtualMachineError,
};

#[derive(Debug, Error, PartialEq)]
pub enum HintError {
    #[error("Unknown Hint: {0}")]
    UnknownHint(String),
    #[error("HintProcessor failed to retrieve the compiled data necessary for hint execution")]
    WrongHintData,
    #[error("Unknown identifier {0}")]
    MissingIdentifier(String),
    #[error("Identifier {0} has no member {1}")]
    IdentifierHasNoMember(String, String),
    #[error("Expected ids.{0} to be a field element")]
    IdentifierNotFelt(String),
    #[error("Expected ids.{0} to be a relocatable value")]
    IdentifierNotRelocatable(String),
    #[error("Tried to compute an address but there was no register in the reference")]
    NoRegisterInReference,
    #[error("Tracking groups should be the same, got {0} and {1}")]
    InvalidTrackingGroup(usize, usize),
    #[error("Variable {0} not present in current execution scope")]
    VariableNotInScope(String),
    #[error("Variable {0} in scope is not of the expected type")]
    WrongScopeVariableType(String),
    #[error("Wrong previous value in dict. Got {0}, expected {1}.")]
    WrongPrevValue(MaybeRelocatable, MaybeRelocatable),
    #[error("Dict Error: No value found for key: {0}")]
    DictKeyNotFound(MaybeRelocatable),
    #[error("unsafe_keccak() can only be used with length<={0}. Got: length={1}")]
    KeccakSizeExceeded(Felt252, Felt252),
    #[error("Invalid word size: {0}")]
    InvalidWordSize(Felt252),
    #[error("Invalid input length, Got: length={0}")]
    InvalidKeccakInputLength(Felt252),
    #[error("Assertion failed, 0 <= ids.a % PRIME < range_check_builtin.bound \n a = {0} is out of range")]
    AssertNNValueOutOfRange(Felt252),
    #[error("Value: {0} is outside valid range")]
    ValueOutsideValidRange(Felt252),
    #[error("Assertion failed, {0} % {1} is equal to 0")]
    AssertNotZero(Felt252, String),
    #[error("assert_not_equal failed: {0} = {1}")]
    AssertNotEqualFail(MaybeRelocatable, MaybeRelocatable),
    #[error("Value: {0} is outside of the range [0, 2**250)")]
    ValueOutside250BitRange(Felt252),
    #[error("Value: {0} is out of range")]
    ValueOutOfRange(Felt252),
    #[error("find_element() can only be used with n_elms <= {0}.\nGot: n_elms = {1}")]
    FindElemMaxSize(Felt252, Felt252),
    #[error("find_element(): No value found for key: {0}")]
    NoValueForKeyFindElement(Felt252),
    #[error(
        "Invalid index found in find_element_index. Index: {0}.\nExpected key: {1}, found_key {2}"
    )]
    InvalidIndex(Felt252, Felt252, Felt252),
    #[error("Set's starting point {0} is bigger than it's ending point {1}")]
    InvalidSetRange(Relocatable, Relocatable),
    #[error("{0}")]
    AssertionFailed(String),
    #[error(transparent)]
    Dict(#[from] DictError),
    #[error(transparent)]
    FromScopeError(#[from] ExecScopeError),
    #[error(transparent)]
    Internal(#[from] VirtualMachineError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Math(#[from] MathError),
}

#[derive(Debug, Error, PartialEq)]
pub enum DictError {
    #[error("Dict Error: No dict tracker found for segment {0}")]
    NoTrackerForSegment(isize),
    #[error("Dict Error: Wrong dict pointer supplied. Got {0}, expected {1}")]
    WrongDictPointer(Relocatable, Relocatable),
    #[error("Dict Error: Tried to create a dict tracker for segment {0} when one already exists")]
    CantCreateDictionaryOnTakenSegment(isize),
}
