pub mod trace_entry {
    use serde::{Deserialize, Serialize};

    use crate::types::relocatable::Relocatable;
    use crate::vm::errors::{memory_errors::MemoryError, trace_errors::TraceError};

    /// One entry per executed instruction, holding the register values before
    /// the instruction ran.
    #[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
    pub struct TraceEntry {
        pub pc: Relocatable,
        pub ap: Relocatable,
        pub fp: Relocatable,
    }

    /// A trace entry after relocation: plain linear addresses.
    #[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
    pub struct RelocatedTraceEntry {
        pub pc: usize,
        pub ap: usize,
        pub fp: usize,
    }

    pub fn relocate_trace_register(
        value: Relocatable,
        relocation_table: &[usize],
    ) -> Result<usize, TraceError> {
        let segment_index: usize = value.segment_index.try_into().map_err(|_| {
            TraceError::Memory(MemoryError::AddressInTemporarySegment(value.segment_index))
        })?;
        if relocation_table.len() <= segment_index {
            return Err(TraceError::NoRelocationFound);
        }
        Ok(relocation_table[segment_index] + value.offset)
    }

}
