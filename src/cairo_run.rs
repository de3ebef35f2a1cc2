use std::io::{self, Write};
use std::path::Path;

use crate::hint_processor::hint_processor_definition::HintProcessor;
use crate::types::program::Program;
use crate::vm::errors::cairo_run_errors::CairoRunError;
use crate::vm::runners::cairo_runner::CairoRunner;
use crate::vm::trace::trace_entry::RelocatedTraceEntry;

pub struct CairoRunConfig<'a> {
    pub entrypoint: &'a str,
    pub print_output: bool,
}

impl<'a> Default for CairoRunConfig<'a> {
    fn default() -> Self {
        CairoRunConfig {
            entrypoint: "main",
            print_output: false,
        }
    }
}

/// Loads, runs and relocates a compiled program.
pub fn cairo_run(
    path: &Path,
    cairo_run_config: &CairoRunConfig,
    hint_executor: &dyn HintProcessor,
) -> Result<CairoRunner, CairoRunError> {
    let program = Program::from_file(path, cairo_run_config.entrypoint)?;
    let mut cairo_runner = CairoRunner::new(&program)?;
    let end = cairo_runner.initialize()?;
    cairo_runner.run_until_pc(end, hint_executor)?;
    cairo_runner.vm.verify_auto_deductions()?;
    cairo_runner.relocate()?;
    if cairo_run_config.print_output {
        cairo_runner.write_output(&mut io::stdout())?;
    }
    Ok(cairo_runner)
}

/// Writes the relocated trace as binary. Each entry is three little-endian
/// 64 bit values: ap, fp, pc.
pub fn write_binary_trace(
    relocated_trace: &[RelocatedTraceEntry],
    writer: &mut impl Write,
) -> io::Result<()> {
    for entry in relocated_trace.iter() {
        writer.write_all(&(entry.ap as u64).to_le_bytes())?;
        writer.write_all(&(entry.fp as u64).to_le_bytes())?;
        writer.write_all(&(entry.pc as u64).to_le_bytes())?;
    }
    writer.flush()
}

/// Writes the relocated memory as binary pairs of little-endian 64 bit
/// address and 32 byte little-endian value.
pub fn write_binary_memory(
    relocated_memory: &[Option<felt::Felt252>],
    writer: &mut impl Write,
) -> io::Result<()> {
    for (addr, value) in relocated_memory.iter().enumerate() {
        if let Some(value) = value {
            writer.write_all(&(addr as u64).to_le_bytes())?;
            let mut bytes = value.to_be_bytes();
            bytes.reverse();
            writer.write_all(&bytes)?;
        }
    }
    writer.flush()
}
