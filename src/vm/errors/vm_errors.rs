use felt::Felt252;
use thiserror::Error;

use crate::types::errors::math_errors::MathError;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::{
    exec_scope_errors::ExecScopeError, hint_errors::HintError, memory_errors::MemoryError,
    runner_errors::RunnerError,
};

#[derive(Debug, Error, PartialEq)]
pub enum VirtualMachineError {
    #[error("Instruction should be a field element; found {0} at pc")]
    InvalidInstructionEncoding(MaybeRelocatable),
    #[error("Instruction out of the 63-bit range: {0}")]
    InvalidInstruction(Felt252),
    #[error("Invalid op1_register value: {0}")]
    InvalidOp1Reg(u64),
    #[error("Invalid pc_update value: {0}")]
    InvalidPcUpdate(u64),
    #[error("Invalid res value: {0}")]
    InvalidRes(u64),
    #[error("Invalid opcode value: {0}")]
    InvalidOpcode(u64),
    #[error("Invalid ap_update value: {0}")]
    InvalidApUpdate(u64),
    #[error("Instruction claims an immediate but the cell at pc + 1 is missing")]
    NoImm,
    #[error("In immediate mode, off2 should be 1")]
    ImmShouldBe1,
    #[error("op0 must be known in double dereference")]
    UnknownOp0,
    #[error("Res.UNCONSTRAINED cannot be used with ApUpdate.ADD")]
    UnconstrainedResAdd,
    #[error("Res.UNCONSTRAINED cannot be used with PcUpdate.JUMP")]
    UnconstrainedResJump,
    #[error("Res.UNCONSTRAINED cannot be used with PcUpdate.JUMP_REL")]
    UnconstrainedResJumpRel,
    #[error("Res.UNCONSTRAINED cannot be used with Opcode.ASSERT_EQ")]
    UnconstrainedResAssertEq,
    #[error("An ASSERT_EQ instruction failed: {0} != {1}")]
    DiffAssertValues(MaybeRelocatable, MaybeRelocatable),
    #[error("Call failed to write return-pc (inconsistent op0): {0} != {1}. Did you forget to increment ap?")]
    CantWriteReturnPc(MaybeRelocatable, MaybeRelocatable),
    #[error("Call failed to write return-fp (inconsistent dst): {0} != {1}. Did you forget to increment ap?")]
    CantWriteReturnFp(MaybeRelocatable, MaybeRelocatable),
    #[error("Couldn't compute operand {0} at address {1}")]
    FailedToComputeOperands(String, Relocatable),
    #[error("Couldn't get or load dst")]
    NoDst,
    #[error("Cannot multiply relocatable values: {0} * {1}")]
    ComputeResRelocatableMul(MaybeRelocatable, MaybeRelocatable),
    #[error("A relocatable value as Res cannot be used with PcUpdate.JUMP_REL")]
    PureValueJumpRel,
    #[error("Inconsistent auto-deduction for builtin {0}, expected {1}, got {2:?}")]
    InconsistentAutoDeduction(&'static str, MaybeRelocatable, Option<MaybeRelocatable>),
    #[error("Expected range_check builtin to be present")]
    NoRangeCheckBuiltin,
    #[error("Hint references the undefined reference id {0}")]
    FailedToGetReference(usize),
    #[error("Hint #{0} failed: {1}")]
    Hint(usize, Box<HintError>),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    RunnerError(#[from] RunnerError),
    #[error(transparent)]
    MainScopeError(#[from] ExecScopeError),
}
