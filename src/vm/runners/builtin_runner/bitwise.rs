use felt::Felt252;

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::vm_memory::memory::Memory;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

pub const CELLS_PER_BITWISE: u32 = 5;
pub const INPUT_CELLS_PER_BITWISE: u32 = 2;
pub const BITWISE_TOTAL_N_BITS: u32 = 251;

#[derive(Debug)]
pub struct BitwiseBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    cells_per_instance: u32,
    total_n_bits: u32,
}

impl BitwiseBuiltinRunner {
    pub fn new(included: bool) -> Self {
        BitwiseBuiltinRunner {
            base: 0,
            included,
            cells_per_instance: CELLS_PER_BITWISE,
            total_n_bits: BITWISE_TOTAL_N_BITS,
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

    /// Cells 2, 3 and 4 of an instance hold x & y, x ^ y and x | y of the
    /// two input cells; inputs must fit in 251 bits.
    pub fn deduce_memory_cell(
        &self,
        address: Relocatable,
        memory: &Memory,
    ) -> Result<Option<MaybeRelocatable>, RunnerError> {
        let index = address.offset % self.cells_per_instance as usize;
        if index <= 1 {
            return Ok(None);
        }
        let x_addr = Relocatable {
            segment_index: address.segment_index,
            offset: address.offset - index,
        };
        let y_addr = x_addr + 1_usize;
        let (num_x, num_y) = match (memory.get(&x_addr), memory.get(&y_addr)) {
            (Some(MaybeRelocatable::Int(num_x)), Some(MaybeRelocatable::Int(num_y))) => {
                (num_x, num_y)
            }
            _ => return Ok(None),
        };
        if num_x.bits() > self.total_n_bits as u64 {
            return Err(RunnerError::IntegerBiggerThanPowerOfTwo(
                x_addr,
                self.total_n_bits,
                num_x.clone(),
            ));
        }
        if num_y.bits() > self.total_n_bits as u64 {
            return Err(RunnerError::IntegerBiggerThanPowerOfTwo(
                y_addr,
                self.total_n_bits,
                num_y.clone(),
            ));
        }
        let (x, y) = (num_x.to_biguint(), num_y.to_biguint());
        let res = match index {
            2 => Some(MaybeRelocatable::Int(Felt252::from(x & y))),
            3 => Some(MaybeRelocatable::Int(Felt252::from(x ^ y))),
            4 => Some(MaybeRelocatable::Int(Felt252::from(x | y))),
            _ => None,
        };
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;

    #[test]
    fn deduce_memory_cell_and() {
        let memory = memory![((0, 5), 10), ((0, 6), 12), ((0, 7), 0)];
        let builtin = BitwiseBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 7), &memory),
            Ok(Some(mayberelocatable!(8)))
        );
    }

    #[test]
    fn deduce_memory_cell_xor() {
        let memory = memory![((0, 5), 10), ((0, 6), 12), ((0, 8), 0)];
        let builtin = BitwiseBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 8), &memory),
            Ok(Some(mayberelocatable!(6)))
        );
    }

    #[test]
    fn deduce_memory_cell_or() {
        let memory = memory![((0, 5), 10), ((0, 6), 12), ((0, 9), 0)];
        let builtin = BitwiseBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 9), &memory),
            Ok(Some(mayberelocatable!(14)))
        );
    }

    #[test]
    fn deduce_memory_cell_input_offset_returns_none() {
        let memory = memory![((0, 3), 10), ((0, 4), 12), ((0, 5), 0)];
        let builtin = BitwiseBuiltinRunner::new(true);
        assert_eq!(
            builtin.deduce_memory_cell(relocatable!(0, 5), &memory),
            Ok(None)
        );
    }

    #[test]
    fn deduce_memory_cell_rejects_oversized_input() {
        let builtin = BitwiseBuiltinRunner::new(true);
        let mut memory = memory![((0, 6), 12), ((0, 7), 0)];
        // 2^251
        memory
            .insert(
                relocatable!(0, 5),
                &MaybeRelocatable::Int(felt::Felt252::from(2_u32).pow(251)),
            )
            .unwrap();
        assert_matches!(
            builtin.deduce_memory_cell(relocatable!(0, 7), &memory),
            Err(RunnerError::IntegerBiggerThanPowerOfTwo(_, 251, _))
        );
    }
}
