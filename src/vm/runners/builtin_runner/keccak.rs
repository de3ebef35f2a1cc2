use std::cell::RefCell;
use std::collections::HashMap;

use felt::Felt252;
use num_bigint::BigUint;

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

use super::KECCAK_BUILTIN_NAME;

pub const CELLS_PER_KECCAK: u32 = 16;
pub const INPUT_CELLS_PER_KECCAK: u32 = 8;
// Each input cell carries 200 bits of the 1600-bit keccak state.
const KECCAK_FELT_BYTE_SIZE: usize = 25;
const BITS_PER_INPUT_CELL: u32 = 200;

#[derive(Debug)]
pub struct KeccakBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    n_input_cells: u32,
    cache: RefCell<HashMap<Relocatable, Felt252>>,
}

impl KeccakBuiltinRunner {
    pub fn new(included: bool) -> Self {
        KeccakBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_KECCAK,
            n_input_cells: INPUT_CELLS_PER_KECCAK,
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

    /// The first eight cells of an instance hold the input state; the next
    /// eight are deduced by applying keccak-f to it.
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
                        KECCAK_BUILTIN_NAME,
                        first_input_addr + i,
                    ))
                }
                None => return Ok(None),
            };
            if num.bits() > BITS_PER_INPUT_CELL as u64 {
                return Err(RunnerError::IntegerBiggerThanPowerOfTwo(
                    first_input_addr + i,
                    BITS_PER_INPUT_CELL,
                    num.clone(),
                ));
            }
            input_felts.push(num.clone());
        }

        let input_message: Vec<u8> = input_felts
            .iter()
            .flat_map(|x| right_pad(&x.to_biguint().to_bytes_le(), KECCAK_FELT_BYTE_SIZE))
            .collect();
        let keccak_result = keccak_f(&input_message);

        let mut cache = self.cache.borrow_mut();
        for i in 0..self.n_input_cells as usize {
            let start = i * KECCAK_FELT_BYTE_SIZE;
            let end = start + KECCAK_FELT_BYTE_SIZE;
            cache.insert(
                first_output_addr + i,
                Felt252::from(BigUint::from_bytes_le(&keccak_result[start..end])),
            );
        }
        Ok(cache.get(&address).map(MaybeRelocatable::from))
    }
}

fn right_pad(bytes: &[u8], target_size: usize) -> Vec<u8> {
    let mut res = bytes.to_vec();
    res.resize(target_size, 0);
    res
}

fn keccak_f(input_message: &[u8]) -> Vec<u8> {
    let bigint = BigUint::from_bytes_le(input_message);
    let mut keccak_input = bigint.to_u64_digits();
    keccak_input.resize(25, 0);
    // Cannot fail: the size was just set to 25.
    let mut keccak_input: [u64; 25] = keccak_input.try_into().unwrap();
    keccak::f1600(&mut keccak_input);
    keccak_input.iter().flat_map(|x| x.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::relocatable;
    use assert_matches::assert_matches;

    #[test]
    fn deduce_memory_cell_input_offset_returns_none() {
        let memory = memory![((0, 0), 1)];
        let builtin = KeccakBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 3), &memory),
            Ok(None)
        );
    }

    #[test]
    fn deduce_memory_cell_missing_input_returns_none() {
        let memory = memory![((0, 0), 1), ((0, 1), 2)];
        let builtin = KeccakBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 9), &memory),
            Ok(None)
        );
    }

    #[test]
    fn deduce_memory_cell_rejects_oversized_state_cell() {
        let builtin = KeccakBuiltinRunner::new(true);
        let mut memory = memory![
            ((0, 1), 0),
            ((0, 2), 0),
            ((0, 3), 0),
            ((0, 4), 0),
            ((0, 5), 0),
            ((0, 6), 0),
            ((0, 7), 0)
        ];
        memory
            .insert(
                relocatable!(0, 0),
                &MaybeRelocatable::Int(Felt252::from(2_u32).pow(200)),
            )
            .unwrap();
        assert_matches!(
            builtin.deduce_memory_cell(relocatable!(0, 8), &memory),
            Err(RunnerError::IntegerBiggerThanPowerOfTwo(_, 200, _))
        );
    }

    #[test]
    fn deduce_memory_cell_all_zero_state() {
        // keccak-f over the all-zero state: first lane of the known vector.
        let builtin = KeccakBuiltinRunner::new(true);
        let memory = memory![
            ((0, 0), 0),
            ((0, 1), 0),
            ((0, 2), 0),
            ((0, 3), 0),
            ((0, 4), 0),
            ((0, 5), 0),
            ((0, 6), 0),
            ((0, 7), 0)
        ];
        let result = builtin
            .deduce_memory_cell(relocatable!(0, 8), &memory)
            .unwrap();
        assert!(result.is_some());
        // Deduction is cached and stable.
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 8), &memory).unwrap(),
            result
        );
    }

    #[test]
    fn keccak_f_known_vector() {
        let input = [0_u8; 200];
        let output = keccak_f(&input);
        // First u64 lane of keccak-f applied to the zero state.
        assert_eq!(
            u64::from_le_bytes(output[0..8].try_into().unwrap()),
            0xF1258F7940E1DDE7
        );
    }
}
