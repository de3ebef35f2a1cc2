use felt::Felt252;
use thiserror::Error;

use crate::types::errors::math_errors::MathError;
use crate::types::relocatable::Relocatable;
use crate::vm::errors::memory_errors::MemoryError;

#[derive(Debug, Error, PartialEq)]
pub enum RunnerError {
    #[error("Can't initialize state without an execution base")]
    NoExecBase,
    #[error("Initialization failure: No program base")]
    NoProgBase,
    #[error("Missing main()")]
    MissingMain,
    #[error("Uninitialized base for builtin")]
    UninitializedBase,
    #[error("Found None PC during VM initialization")]
    NoPC,
    #[error("Found None AP during VM initialization")]
    NoAP,
    #[error("Found None FP during VM initialization")]
    NoFP,
    #[error("Memory loading failed during state initialization: {0}")]
    MemoryInitializationError(MemoryError),
    #[error("Memory validation failed during VM initialization: {0}")]
    MemoryValidationError(MemoryError),
    #[error("No builtin runner can be built for name {0}")]
    NoBuiltinForName(String),
    #[error("Builtin base mustn't be in a temporary segment, segment: {0}")]
    RunnerInTemporarySegment(isize),
    #[error("Expected integer at address {1} of the {0} builtin")]
    BuiltinExpectedInteger(&'static str, Relocatable),
    #[error("Expected integer at address {0} to be smaller than 2^{1}, Got {2}")]
    IntegerBiggerThanPowerOfTwo(Relocatable, u32, Felt252),
    #[error("EcOpBuiltin: point {0:?} is not on the curve")]
    PointNotOnCurve((Felt252, Felt252)),
    #[error("EcOpBuiltin: addition of points with the same x coordinate: {0}")]
    EcOpSameXCoordinate(String),
    #[error("ECDSA builtin: no signature registered for public key address {0}")]
    SignatureNotFound(Relocatable),
    #[error("ECDSA builtin: signature verification failed for public key at {0}")]
    InvalidSignature(Relocatable),
    #[error("Failed to write program output")]
    WriteFail,
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Math(#[from] MathError),
}
