use std::cell::RefCell;
use std::collections::HashMap;

use felt::Felt252;
use starknet_crypto::{poseidon_permute_comp, FieldElement};

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

use super::POSEIDON_BUILTIN_NAME;

pub const CELLS_PER_POSEIDON: u32 = 6;
pub const INPUT_CELLS_PER_POSEIDON: u32 = 3;

#[derive(Debug)]
pub struct PoseidonBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    n_input_cells: u32,
    cache: RefCell<HashMap<Relocatable, Felt252>>,
}

impl PoseidonBuiltinRunner {
    pub fn new(included: bool) -> Self {
        PoseidonBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_POSEIDON,
            n_input_cells: INPUT_CELLS_PER_POSEIDON,
            cache: RefCell::new(HashMap::new()),
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

    /// Cells 3..6 of an instance are the poseidon permutation of cells 0..3.
    pub fn deduce_memory_cell(
        &self,
        address: Relocatable,
        memory: &Memory,
    ) -> Result<Option<MaybeRelocatable>, RunnerError> {
        let index = address.offset % self.cells_per_instance as usize;
        if index < self.n_input_cells as usize {
            return Ok(None);
        }
        if let Some(felt) = self.cache.borrow().get(&address) {
            return Ok(Some(felt.into()));
        }
        let first_input_addr = Relocatable {
            segment_index: address.segment_index,
            offset: address.offset - index,
        };
        let first_output_addr = first_input_addr + self.n_input_cells as usize;

        let mut input_felts = Vec::with_capacity(self.n_input_cells as usize);
        for i in 0..self.n_input_cells as usize {
            let num = match memory.get(&(first_input_addr + i)) {
                Some(MaybeRelocatable::Int(num)) => num,
                Some(MaybeRelocatable::RelocatableValue(_)) => {
                    return Err(RunnerError::BuiltinExpectedInteger(
                        POSEIDON_BUILTIN_NAME,
                        first_input_addr + i,
                    ))
                }
                None => return Ok(None),
            };
            let felt = FieldElement::from_bytes_be(&num.to_be_bytes()).map_err(|_| {
                RunnerError::BuiltinExpectedInteger(POSEIDON_BUILTIN_NAME, first_input_addr + i)
            })?;
            input_felts.push(felt);
        }
        // Cannot fail: the vec was just filled with n_input_cells elements.
        let mut poseidon_state: [FieldElement; 3] = input_felts.try_into().unwrap();
        poseidon_permute_comp(&mut poseidon_state);
        let mut cache = self.cache.borrow_mut();
        for (i, elem) in poseidon_state.iter().enumerate() {
            cache.insert(
                first_output_addr + i,
                Felt252::from_bytes_be(&elem.to_bytes_be()),
            );
        }
        Ok(cache.get(&address).map(MaybeRelocatable::from))
    }
}
