use std::cell::RefCell;
use std::collections::HashSet;

use felt::Felt252;
use starknet_crypto::{pedersen_hash, FieldElement};

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

use super::HASH_BUILTIN_NAME;

pub const CELLS_PER_HASH: u32 = 3;
pub const INPUT_CELLS_PER_HASH: u32 = 2;

#[derive(Debug)]
pub struct HashBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    // Cells already deduced; deduction must be idempotent and a filled output
    // cell must not be recomputed.
    verified_addresses: RefCell<HashSet<Relocatable>>,
}

impl HashBuiltinRunner {
    pub fn new(included: bool) -> Self {
        HashBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_HASH,
            verified_addresses: RefCell::new(HashSet::new()),
        }
    }

    pub fn initialize_segments(&mut self, segments: &mut MemorySegmentManager) {
        self.base = segments.add().segment_index as usize
    }

    pub fn initial_stack(&self) -> Vec<MaybeRelocatable> {
        if self.included {
            vec![MaybeRelocatable::from((self.base as isize, 0))]
        } else {
            vec![]
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Every third cell holds the hash of the two cells before it.
    pub fn deduce_memory_cell(
        &self,
        address: Relocatable,
        memory: &Memory,
    ) -> Result<Option<MaybeRelocatable>, RunnerError> {
        if address.offset % self.cells_per_instance as usize != 2
            || self.verified_addresses.borrow().contains(&address)
        {
            return Ok(None);
        };
        let num_a = memory.get(&Relocatable {
            segment_index: address.segment_index,
            offset: address.offset - 2,
        });
        let num_b = memory.get(&Relocatable {
            segment_index: address.segment_index,
            offset: address.offset - 1,
        });
        if let (Some(MaybeRelocatable::Int(num_a)), Some(MaybeRelocatable::Int(num_b))) =
            (num_a, num_b)
        {
            let x = FieldElement::from_bytes_be(&num_a.to_be_bytes())
                .map_err(|_| RunnerError::BuiltinExpectedInteger(HASH_BUILTIN_NAME, address))?;
            let y = FieldElement::from_bytes_be(&num_b.to_be_bytes())
                .map_err(|_| RunnerError::BuiltinExpectedInteger(HASH_BUILTIN_NAME, address))?;
            self.verified_addresses.borrow_mut().insert(address);
            let result = Felt252::from_bytes_be(&pedersen_hash(&x, &y).to_bytes_be());
            return Ok(Some(MaybeRelocatable::Int(result)));
        }
        Ok(None)
    }
}
