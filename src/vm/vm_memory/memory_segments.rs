use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::memory_errors::MemoryError;
use crate::vm::vm_memory::memory::Memory;

pub struct MemorySegmentManager {
    pub memory: Memory,
    segment_used_sizes: Option<Vec<usize>>,
}

impl MemorySegmentManager {
    pub fn new() -> MemorySegmentManager {
        MemorySegmentManager {
            memory: Memory::new(),
            segment_used_sizes: None,
        }
    }

    pub fn num_segments(&self) -> usize {
        self.memory.data.len()
    }

    pub fn num_temp_segments(&self) -> usize {
        self.memory.temp_data.len()
    }

    /// Adds a new segment and returns its starting address.
    pub fn add(&mut self) -> Relocatable {
        self.memory.data.push(Vec::new());
        Relocatable {
            segment_index: (self.memory.data.len() - 1) as isize,
            offset: 0,
        }
    }

    /// Adds a temporary segment; temporary segments get negative indexes and
    /// are skipped by relocation.
    pub fn add_temporary_segment(&mut self) -> Relocatable {
        self.memory.temp_data.push(Vec::new());
        Relocatable {
            segment_index: -(self.memory.temp_data.len() as isize),
            offset: 0,
        }
    }

    /// Writes data starting at ptr and returns the first address after it.
    pub fn load_data(
        &mut self,
        ptr: Relocatable,
        data: &[MaybeRelocatable],
    ) -> Result<Relocatable, MemoryError> {
        for (num, value) in data.iter().enumerate() {
            self.memory.insert(ptr + num, value)?;
        }
        Ok(ptr + data.len())
    }

    /// Freezes each segment's size to the highest written offset plus one.
    pub fn compute_effective_sizes(&mut self) -> &Vec<usize> {
        let sizes = self.memory.data.iter().map(Vec::len).collect();
        self.segment_used_sizes.get_or_insert(sizes)
    }

    pub fn get_segment_used_size(&self, index: usize) -> Option<usize> {
        self.segment_used_sizes.as_ref()?.get(index).copied()
    }

    /// Returns the start of each segment in the flat address space, starting
    /// at address 1.
    pub fn relocate_segments(&self) -> Result<Vec<usize>, MemoryError> {
        let first_addr = 1;
        let mut relocation_table = vec![first_addr];
        match &self.segment_used_sizes {
            Some(segment_used_sizes) => {
                for (i, size) in segment_used_sizes.iter().enumerate() {
                    relocation_table.push(relocation_table[i] + size);
                }
            }
            None => return Err(MemoryError::MissingSegmentUsedSizes),
        }
        // The last entry is the first address after the relocated memory.
        relocation_table.pop();
        Ok(relocation_table)
    }
}

impl Default for MemorySegmentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};

    #[test]
    fn add_segments_monotonically() {
        let mut segments = MemorySegmentManager::new();
        assert_eq!(segments.add(), relocatable!(0, 0));
        assert_eq!(segments.add(), relocatable!(1, 0));
        assert_eq!(segments.num_segments(), 2);
    }

    #[test]
    fn add_temporary_segments_count_down() {
        let mut segments = MemorySegmentManager::new();
        assert_eq!(segments.add_temporary_segment(), relocatable!(-1, 0));
        assert_eq!(segments.add_temporary_segment(), relocatable!(-2, 0));
        assert_eq!(segments.num_temp_segments(), 2);
    }

    #[test]
    fn load_data_returns_next_address() {
        let mut segments = MemorySegmentManager::new();
        segments.add();
        let data = vec![
            mayberelocatable!(4),
            mayberelocatable!(5),
            mayberelocatable!(6),
        ];
        let end = segments.load_data(relocatable!(0, 0), &data).unwrap();
        assert_eq!(end, relocatable!(0, 3));
        assert_eq!(
            segments.memory.get(&relocatable!(0, 2)),
            Some(&mayberelocatable!(6))
        );
    }

    #[test]
    fn compute_effective_sizes_counts_gaps() {
        let mut segments = segments![((0, 2), 1), ((0, 5), 1), ((0, 7), 1), ((1, 1), 1)];
        assert_eq!(segments.compute_effective_sizes(), &vec![8, 2]);
    }

    #[test]
    fn effective_sizes_are_frozen_after_first_call() {
        let mut segments = segments![((0, 1), 1)];
        segments.compute_effective_sizes();
        segments
            .memory
            .insert(relocatable!(0, 5), &mayberelocatable!(2))
            .unwrap();
        assert_eq!(segments.compute_effective_sizes(), &vec![2]);
    }

    #[test]
    fn relocate_segments_requires_effective_sizes() {
        let segments = MemorySegmentManager::new();
        assert_eq!(
            segments.relocate_segments(),
            Err(MemoryError::MissingSegmentUsedSizes)
        );
    }

    #[test]
    fn relocate_segments_accumulates_sizes() {
        let mut segments = MemorySegmentManager::new();
        segments.segment_used_sizes = Some(vec![3, 3, 56, 78, 8]);
        assert_eq!(segments.relocate_segments(), Ok(vec![1, 4, 7, 63, 141]));
    }
}
