use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

mod bitwise;
mod ec_op;
mod hash;
mod keccak;
mod output;
mod poseidon;
mod range_check;
mod signature;

pub use bitwise::BitwiseBuiltinRunner;
pub use ec_op::EcOpBuiltinRunner;
pub use hash::HashBuiltinRunner;
pub use keccak::KeccakBuiltinRunner;
pub use output::OutputBuiltinRunner;
pub use poseidon::PoseidonBuiltinRunner;
pub use range_check::RangeCheckBuiltinRunner;
pub use signature::SignatureBuiltinRunner;

pub const OUTPUT_BUILTIN_NAME: &str = "output";
pub const HASH_BUILTIN_NAME: &str = "pedersen";
pub const RANGE_CHECK_BUILTIN_NAME: &str = "range_check";
pub const SIGNATURE_BUILTIN_NAME: &str = "ecdsa";
pub const BITWISE_BUILTIN_NAME: &str = "bitwise";
pub const EC_OP_BUILTIN_NAME: &str = "ec_op";
pub const KECCAK_BUILTIN_NAME: &str = "keccak";
pub const POSEIDON_BUILTIN_NAME: &str = "poseidon";

/* An enum rather than a trait object: the set of builtins is closed, so the
 * dispatch can stay static and the runners remain plain values.
 */
#[derive(Debug)]
pub enum BuiltinRunner {
    Bitwise(BitwiseBuiltinRunner),
    EcOp(EcOpBuiltinRunner),
    Hash(HashBuiltinRunner),
    Keccak(KeccakBuiltinRunner),
    Output(OutputBuiltinRunner),
    Poseidon(PoseidonBuiltinRunner),
    RangeCheck(RangeCheckBuiltinRunner),
    Signature(SignatureBuiltinRunner),
}

impl BuiltinRunner {
    /// Builds the runner matching a name from the program's builtins list.
    pub fn from_builtin_name(name: &str) -> Result<BuiltinRunner, RunnerError> {
        match name {
            OUTPUT_BUILTIN_NAME => Ok(OutputBuiltinRunner::new(true).into()),
            HASH_BUILTIN_NAME => Ok(HashBuiltinRunner::new(true).into()),
            RANGE_CHECK_BUILTIN_NAME => Ok(RangeCheckBuiltinRunner::new(true).into()),
            SIGNATURE_BUILTIN_NAME => Ok(SignatureBuiltinRunner::new(true).into()),
            BITWISE_BUILTIN_NAME => Ok(BitwiseBuiltinRunner::new(true).into()),
            EC_OP_BUILTIN_NAME => Ok(EcOpBuiltinRunner::new(true).into()),
            KECCAK_BUILTIN_NAME => Ok(KeccakBuiltinRunner::new(true).into()),
            POSEIDON_BUILTIN_NAME => Ok(PoseidonBuiltinRunner::new(true).into()),
            _ => Err(RunnerError::NoBuiltinForName(name.to_string())),
        }
    }

    ///Creates a segment for the builtin and stores its base.
    pub fn initialize_segments(&mut self, segments: &mut MemorySegmentManager) {
        match self {
            BuiltinRunner::Bitwise(bitwise) => bitwise.initialize_segments(segments),
            BuiltinRunner::EcOp(ec) => ec.initialize_segments(segments),
            BuiltinRunner::Hash(hash) => hash.initialize_segments(segments),
            BuiltinRunner::Keccak(keccak) => keccak.initialize_segments(segments),
            BuiltinRunner::Output(output) => output.initialize_segments(segments),
            BuiltinRunner::Poseidon(poseidon) => poseidon.initialize_segments(segments),
            BuiltinRunner::RangeCheck(range_check) => range_check.initialize_segments(segments),
            BuiltinRunner::Signature(signature) => signature.initialize_segments(segments),
        }
    }

    pub fn initial_stack(&self) -> Vec<MaybeRelocatable> {
        match self {
            BuiltinRunner::Bitwise(bitwise) => bitwise.initial_stack(),
            BuiltinRunner::EcOp(ec) => ec.initial_stack(),
            BuiltinRunner::Hash(hash) => hash.initial_stack(),
            BuiltinRunner::Keccak(keccak) => keccak.initial_stack(),
            BuiltinRunner::Output(output) => output.initial_stack(),
            BuiltinRunner::Poseidon(poseidon) => poseidon.initial_stack(),
            BuiltinRunner::RangeCheck(range_check) => range_check.initial_stack(),
            BuiltinRunner::Signature(signature) => signature.initial_stack(),
        }
    }

    pub fn base(&self) -> usize {
        match self {
            BuiltinRunner::Bitwise(bitwise) => bitwise.base(),
            BuiltinRunner::EcOp(ec) => ec.base(),
            BuiltinRunner::Hash(hash) => hash.base(),
            BuiltinRunner::Keccak(keccak) => keccak.base(),
            BuiltinRunner::Output(output) => output.base(),
            BuiltinRunner::Poseidon(poseidon) => poseidon.base(),
            BuiltinRunner::RangeCheck(range_check) => range_check.base(),
            BuiltinRunner::Signature(signature) => signature.base(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinRunner::Bitwise(_) => BITWISE_BUILTIN_NAME,
            BuiltinRunner::EcOp(_) => EC_OP_BUILTIN_NAME,
            BuiltinRunner::Hash(_) => HASH_BUILTIN_NAME,
            BuiltinRunner::Keccak(_) => KECCAK_BUILTIN_NAME,
            BuiltinRunner::Output(_) => OUTPUT_BUILTIN_NAME,
            BuiltinRunner::Poseidon(_) => POSEIDON_BUILTIN_NAME,
            BuiltinRunner::RangeCheck(_) => RANGE_CHECK_BUILTIN_NAME,
            BuiltinRunner::Signature(_) => SIGNATURE_BUILTIN_NAME,
        }
    }

    pub fn add_validation_rule(&self, memory: &mut Memory) {
        match self {
            BuiltinRunner::RangeCheck(range_check) => range_check.add_validation_rule(memory),
            BuiltinRunner::Signature(signature) => signature.add_validation_rule(memory),
            _ => (),
        }
    }

    pub fn deduce_memory_cell(
        &self,
        address: Relocatable,
        memory: &Memory,
    ) -> Result<Option<MaybeRelocatable>, RunnerError> {
        match self {
            BuiltinRunner::Bitwise(bitwise) => bitwise.deduce_memory_cell(address, memory),
            BuiltinRunner::EcOp(ec) => ec.deduce_memory_cell(address, memory),
            BuiltinRunner::Hash(hash) => hash.deduce_memory_cell(address, memory),
            BuiltinRunner::Keccak(keccak) => keccak.deduce_memory_cell(address, memory),
            BuiltinRunner::Poseidon(poseidon) => poseidon.deduce_memory_cell(address, memory),
            BuiltinRunner::Output(_)
            | BuiltinRunner::RangeCheck(_)
            | BuiltinRunner::Signature(_) => Ok(None),
        }
    }
}

impl From<BitwiseBuiltinRunner> for BuiltinRunner {
    fn from(runner: BitwiseBuiltinRunner) -> Self {
        BuiltinRunner::Bitwise(runner)
    }
}

impl From<EcOpBuiltinRunner> for BuiltinRunner {
    fn from(runner: EcOpBuiltinRunner) -> Self {
        BuiltinRunner::EcOp(runner)
    }
}

impl From<HashBuiltinRunner> for BuiltinRunner {
    fn from(runner: HashBuiltinRunner) -> Self {
        BuiltinRunner::Hash(runner)
    }
}

impl From<KeccakBuiltinRunner> for BuiltinRunner {
    fn from(runner: KeccakBuiltinRunner) -> Self {
        BuiltinRunner::Keccak(runner)
    }
}

impl From<OutputBuiltinRunner> for BuiltinRunner {
    fn from(runner: OutputBuiltinRunner) -> Self {
        BuiltinRunner::Output(runner)
    }
}

impl From<PoseidonBuiltinRunner> for BuiltinRunner {
    fn from(runner: PoseidonBuiltinRunner) -> Self {
        BuiltinRunner::Poseidon(runner)
    }
}

impl From<RangeCheckBuiltinRunner> for BuiltinRunner {
    fn from(runner: RangeCheckBuiltinRunner) -> Self {
        BuiltinRunner::RangeCheck(runner)
    }
}

impl From<SignatureBuiltinRunner> for BuiltinRunner {
    fn from(runner: SignatureBuiltinRunner) -> Self {
        BuiltinRunner::Signature(runner)
    }
}
