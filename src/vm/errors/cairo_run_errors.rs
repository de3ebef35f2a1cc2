use thiserror::Error;

use crate::types::errors::program_errors::ProgramError;
use crate::vm::errors::{
    runner_errors::RunnerError, trace_errors::TraceError, vm_errors::VirtualMachineError,
};

#[derive(Debug, Error)]
pub enum CairoRunError {
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    VirtualMachine(#[from] VirtualMachineError),
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
