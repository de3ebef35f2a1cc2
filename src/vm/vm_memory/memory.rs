use std::collections::{HashMap, HashSet};

use felt::Felt252;

use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::memory_errors::MemoryError;

pub struct ValidationRule(
    #[allow(clippy::type_complexity)]
    pub  Box<dyn Fn(&Memory, Relocatable) -> Result<Vec<Relocatable>, MemoryError>>,
);

/// Write-once memory, addressed by segment. Cells of segments with a negative
/// index live in `temp_data` until (if ever) the run promotes them.
pub struct Memory {
    pub data: Vec<Vec<Option<MaybeRelocatable>>>,
    pub temp_data: Vec<Vec<Option<MaybeRelocatable>>>,
    validation_rules: HashMap<usize, ValidationRule>,
    validated_addresses: HashSet<Relocatable>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            data: Vec::new(),
            temp_data: Vec::new(),
            validation_rules: HashMap::new(),
            validated_addresses: HashSet::new(),
        }
    }

    /// Inserts a value at an address. Re-inserting the value already present
    /// succeeds; inserting a different one is an inconsistency.
    pub fn insert<V>(&mut self, key: Relocatable, val: V) -> Result<(), MemoryError>
    where
        V: Into<MaybeRelocatable>,
    {
        let val = val.into();
        let (i, j) = from_relocatable_to_indexes(key);
        let data = if key.segment_index < 0 {
            &mut self.temp_data
        } else {
            &mut self.data
        };
        let num_segments = data.len();
        let segment = data
            .get_mut(i)
            .ok_or(MemoryError::UnallocatedSegment(i, num_segments))?;
        if segment.len() <= j {
            segment.resize(j + 1, None);
        }
        match &segment[j] {
            Some(current) if current != &val => {
                return Err(MemoryError::InconsistentMemory(
                    key,
                    current.clone(),
                    val,
                ))
            }
            Some(_) => return Ok(()),
            None => segment[j] = Some(val),
        }
        self.validate_memory_cell(key)
    }

    pub fn get(&self, key: &Relocatable) -> Option<&MaybeRelocatable> {
        let (i, j) = from_relocatable_to_indexes(*key);
        let data = if key.segment_index < 0 {
            &self.temp_data
        } else {
            &self.data
        };
        data.get(i)?.get(j)?.as_ref()
    }

    pub fn get_integer(&self, key: Relocatable) -> Result<&Felt252, MemoryError> {
        self.get(&key)
            .ok_or(MemoryError::UnknownMemoryCell(key))?
            .get_int_ref()
            .ok_or(MemoryError::ExpectedFelt(key))
    }

    pub fn get_relocatable(&self, key: Relocatable) -> Result<Relocatable, MemoryError> {
        self.get(&key)
            .ok_or(MemoryError::UnknownMemoryCell(key))?
            .get_relocatable()
            .ok_or(MemoryError::ExpectedRelocatable(key))
    }

    pub fn add_validation_rule(&mut self, segment_index: usize, rule: ValidationRule) {
        self.validation_rules.insert(segment_index, rule);
    }

    fn validate_memory_cell(&mut self, addr: Relocatable) -> Result<(), MemoryError> {
        if addr.segment_index < 0 || self.validated_addresses.contains(&addr) {
            return Ok(());
        }
        if let Some(rule) = self.validation_rules.get(&(addr.segment_index as usize)) {
            let validated = rule.0(self, addr)?;
            self.validated_addresses.extend(validated);
        }
        Ok(())
    }

    /// Applies the registered validation rules to every cell written so far.
    /// Used right after loading the initial state.
    pub fn validate_existing_memory(&mut self) -> Result<(), MemoryError> {
        for i in 0..self.data.len() {
            for j in 0..self.data[i].len() {
                if self.data[i][j].is_some() {
                    self.validate_memory_cell(Relocatable::from((i as isize, j)))?;
                }
            }
        }
        Ok(())
    }

    pub fn is_validated(&self, addr: &Relocatable) -> bool {
        self.validated_addresses.contains(addr)
    }

    pub fn get_range(&self, addr: Relocatable, size: usize) -> Vec<Option<&MaybeRelocatable>> {
        (0..size).map(|i| self.get(&(addr + i))).collect()
    }

    pub fn get_continuous_range(
        &self,
        addr: Relocatable,
        size: usize,
    ) -> Result<Vec<MaybeRelocatable>, MemoryError> {
        (0..size)
            .map(|i| {
                self.get(&(addr + i))
                    .cloned()
                    .ok_or(MemoryError::UnknownMemoryCell(addr + i))
            })
            .collect()
    }

    pub fn get_integer_range(
        &self,
        addr: Relocatable,
        size: usize,
    ) -> Result<Vec<Felt252>, MemoryError> {
        (0..size)
            .map(|i| self.get_integer(addr + i).cloned())
            .collect()
    }

    /// Structural comparison of two cell ranges, cell by cell.
    pub fn mem_eq(&self, lhs: Relocatable, rhs: Relocatable, len: usize) -> bool {
        (0..len).all(|i| self.get(&(lhs + i)) == self.get(&(rhs + i)))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

pub fn from_relocatable_to_indexes(relocatable: Relocatable) -> (usize, usize) {
    if relocatable.segment_index.is_negative() {
        (
            -(relocatable.segment_index + 1) as usize,
            relocatable.offset,
        )
    } else {
        (relocatable.segment_index as usize, relocatable.offset)
    }
}
