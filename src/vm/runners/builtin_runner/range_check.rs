use crate::types::relocatable::MaybeRelocatable;
use crate::vm::errors::memory_errors::{MemoryError, RangeCheckError};
use crate::vm::vm_memory::memory::{Memory, ValidationRule};
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;

pub const INNER_RC_BOUND_SHIFT: u64 = 16;
pub const N_PARTS: u64 = 8;
pub const CELLS_PER_RANGE_CHECK: u32 = 1;

#[derive(Debug)]
pub struct RangeCheckBuiltinRunner {
    base: usize,
    pub(crate) included: bool,
    // Bound in bits: values must stay below 2^(16 * N_PARTS).
    n_bits: u64,
}

impl RangeCheckBuiltinRunner {
    pub fn new(included: bool) -> RangeCheckBuiltinRunner {
        RangeCheckBuiltinRunner {
            base: 0,
            included,
            n_bits: INNER_RC_BOUND_SHIFT * N_PARTS,
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

    /// First value outside the builtin's range, 2^128.
    pub fn bound(&self) -> felt::Felt252 {
        felt::Felt252::from(2_u32).pow(self.n_bits as u32)
    }

    /// Every insert into the range-check segment must be a felt of at most
    /// 128 bits; anything else aborts the write.
    pub fn add_validation_rule(&self, memory: &mut Memory) {
        let n_bits = self.n_bits;
        let rule: ValidationRule = ValidationRule(Box::new(
            move |memory: &Memory, address| -> Result<Vec<_>, MemoryError> {
                let value = memory
                    .get(&address)
                    .ok_or(MemoryError::UnknownMemoryCell(address))?;
                match value {
                    MaybeRelocatable::Int(felt) if felt.bits() <= n_bits => Ok(vec![address]),
                    MaybeRelocatable::Int(felt) => {
                        Err(RangeCheckError::OutOfBounds(felt.clone()).into())
                    }
                    MaybeRelocatable::RelocatableValue(_) => {
                        Err(RangeCheckError::NotAFelt(address).into())
                    }
                }
            },
        ));
        memory.add_validation_rule(self.base, rule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;
    use felt::{felt_str, Felt252};

    fn range_check_memory() -> (RangeCheckBuiltinRunner, Memory) {
        let mut builtin = RangeCheckBuiltinRunner::new(true);
        let mut segments = MemorySegmentManager::new();
        builtin.initialize_segments(&mut segments);
        let mut memory = segments.memory;
        builtin.add_validation_rule(&mut memory);
        (builtin, memory)
    }

    #[test]
    fn valid_felt_is_validated_on_insert() {
        let (builtin, mut memory) = range_check_memory();
        memory
            .insert(relocatable!(builtin.base() as isize, 0), &mayberelocatable!(1234))
            .unwrap();
        assert!(memory.is_validated(&relocatable!(0, 0)));
    }

    #[test]
    fn bound_is_two_to_the_128() {
        let (_, mut memory) = range_check_memory();
        let just_below = Felt252::from(u128::MAX);
        assert_eq!(
            memory.insert(relocatable!(0, 0), &MaybeRelocatable::Int(just_below)),
            Ok(())
        );
        // 2^129
        let too_big = felt_str!("680564733841876926926749214863536422912");
        assert_matches!(
            memory.insert(relocatable!(0, 1), &MaybeRelocatable::Int(too_big.clone())),
            Err(MemoryError::RangeCheck(RangeCheckError::OutOfBounds(v))) if v == too_big
        );
    }

    #[test]
    fn out_of_bounds_error_message_is_stable() {
        let too_big = felt_str!("680564733841876926926749214863536422912");
        assert_eq!(
            RangeCheckError::OutOfBounds(too_big).to_string(),
            "Value 680564733841876926926749214863536422912 is out of bounds [0, 2^128]"
        );
    }

    #[test]
    fn relocatable_value_is_rejected() {
        let (_, mut memory) = range_check_memory();
        assert_matches!(
            memory.insert(relocatable!(0, 0), &mayberelocatable!(1, 2)),
            Err(MemoryError::RangeCheck(RangeCheckError::NotAFelt(_)))
        );
    }

    #[test]
    fn memory_macro_unaffected_segments_skip_validation() {
        let memory = memory![((0, 0), 1)];
        assert!(!memory.is_validated(&relocatable!(0, 0)));
    }
}
