use std::any::Any;
use std::collections::HashMap;
use std::io::Write;

use felt::Felt252;

use crate::hint_processor::hint_processor_definition::{HintProcessor, HintReference};
use crate::types::exec_scope::ExecutionScopes;
use crate::types::program::Program;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::memory_errors::MemoryError;
use crate::vm::errors::runner_errors::RunnerError;
use crate::vm::errors::trace_errors::TraceError;
use crate::vm::errors::vm_errors::VirtualMachineError;
use crate::vm::runners::builtin_runner::BuiltinRunner;
use crate::vm::trace::trace_entry::{relocate_trace_register, RelocatedTraceEntry};
use crate::vm::vm_core::VirtualMachine;

/// Drives a program from loading to relocation: owns the VM, the execution
/// scopes and the relocated artifacts.
pub struct CairoRunner {
    program: Program,
    pub vm: VirtualMachine,
    pub exec_scopes: ExecutionScopes,
    program_base: Option<Relocatable>,
    execution_base: Option<Relocatable>,
    initial_ap: Option<Relocatable>,
    initial_fp: Option<Relocatable>,
    initial_pc: Option<Relocatable>,
    final_pc: Option<Relocatable>,
    pub relocated_memory: Vec<Option<Felt252>>,
    pub relocated_trace: Vec<RelocatedTraceEntry>,
}

impl CairoRunner {
    pub fn new(program: &Program) -> Result<CairoRunner, RunnerError> {
        let mut vm = VirtualMachine::new();
        for builtin_name in program.builtins.iter() {
            vm.builtin_runners
                .push(BuiltinRunner::from_builtin_name(builtin_name)?);
        }
        Ok(CairoRunner {
            program: program.clone(),
            vm,
            exec_scopes: ExecutionScopes::new(),
            program_base: None,
            execution_base: None,
            initial_ap: None,
            initial_fp: None,
            initial_pc: None,
            final_pc: None,
            relocated_memory: Vec::new(),
            relocated_trace: Vec::new(),
        })
    }

    /// Creates program, execution and builtin segments, initializes the
    /// initial stack and registers, and returns the end sentinel the run
    /// stops at.
    pub fn initialize(&mut self) -> Result<Relocatable, RunnerError> {
        self.initialize_segments(None);
        let end = self.initialize_main_entrypoint()?;
        self.initialize_vm()?;
        Ok(end)
    }

    pub fn initialize_segments(&mut self, program_base: Option<Relocatable>) {
        self.program_base = match program_base {
            Some(base) => Some(base),
            None => Some(self.vm.segments.add()),
        };
        self.execution_base = Some(self.vm.segments.add());
        for builtin_runner in self.vm.builtin_runners.iter_mut() {
            builtin_runner.initialize_segments(&mut self.vm.segments);
        }
    }

    fn initialize_state(
        &mut self,
        entrypoint: usize,
        stack: Vec<MaybeRelocatable>,
    ) -> Result<(), RunnerError> {
        let prog_base = self.program_base.ok_or(RunnerError::NoProgBase)?;
        let exec_base = self.execution_base.ok_or(RunnerError::NoExecBase)?;
        self.initial_pc = Some(prog_base + entrypoint);
        self.vm
            .segments
            .load_data(prog_base, &self.program.data)
            .map_err(RunnerError::MemoryInitializationError)?;
        self.vm
            .segments
            .load_data(exec_base, &stack)
            .map_err(RunnerError::MemoryInitializationError)?;
        Ok(())
    }

    pub fn initialize_function_entrypoint(
        &mut self,
        entrypoint: usize,
        mut stack: Vec<MaybeRelocatable>,
        return_fp: MaybeRelocatable,
    ) -> Result<Relocatable, RunnerError> {
        let end = self.vm.segments.add();
        stack.append(&mut vec![
            return_fp,
            MaybeRelocatable::RelocatableValue(end),
        ]);
        let exec_base = self.execution_base.ok_or(RunnerError::NoExecBase)?;
        self.initial_fp = Some(exec_base + stack.len());
        self.initial_ap = self.initial_fp;
        self.initialize_state(entrypoint, stack)?;
        self.final_pc = Some(end);
        Ok(end)
    }

    ///Initializes state for running a program from the main() entrypoint.
    ///Returns the value of the program counter after returning from main.
    fn initialize_main_entrypoint(&mut self) -> Result<Relocatable, RunnerError> {
        let mut stack = Vec::new();
        for builtin_runner in self.vm.builtin_runners.iter() {
            stack.append(&mut builtin_runner.initial_stack());
        }
        let return_fp = self.vm.segments.add();
        let main = self.program.main.ok_or(RunnerError::MissingMain)?;
        self.initialize_function_entrypoint(
            main,
            stack,
            MaybeRelocatable::RelocatableValue(return_fp),
        )
    }

    pub fn initialize_vm(&mut self) -> Result<(), RunnerError> {
        let initial_pc = self.initial_pc.ok_or(RunnerError::NoPC)?;
        let initial_ap = self.initial_ap.ok_or(RunnerError::NoAP)?;
        let initial_fp = self.initial_fp.ok_or(RunnerError::NoFP)?;
        self.vm.run_context = crate::vm::context::run_context::RunContext::new(
            initial_pc, initial_ap, initial_fp,
        );
        for builtin in self.vm.builtin_runners.iter() {
            builtin.add_validation_rule(&mut self.vm.segments.memory);
        }
        self.vm
            .segments
            .memory
            .validate_existing_memory()
            .map_err(RunnerError::MemoryValidationError)
    }

    /// Compiles every hint of the program, keyed by the pc offset it is
    /// attached to.
    pub fn get_hint_data_dictionary(
        &self,
        hint_executor: &dyn HintProcessor,
    ) -> Result<HashMap<usize, Vec<Box<dyn Any>>>, VirtualMachineError> {
        let references: Vec<HintReference> = self
            .program
            .reference_manager
            .references
            .iter()
            .map(HintReference::from)
            .collect();
        let mut hint_data_dictionary = HashMap::<usize, Vec<Box<dyn Any>>>::new();
        for (hint_index, hints) in self.program.hints.iter() {
            for hint in hints {
                let hint_data = hint_executor.compile_hint(
                    &hint.code,
                    &hint.flow_tracking_data.ap_tracking,
                    &hint.flow_tracking_data.reference_ids,
                    &references,
                )?;
                hint_data_dictionary
                    .entry(*hint_index)
                    .or_default()
                    .push(hint_data);
            }
        }
        Ok(hint_data_dictionary)
    }

    pub fn run_until_pc(
        &mut self,
        address: Relocatable,
        hint_processor: &dyn HintProcessor,
    ) -> Result<(), VirtualMachineError> {
        let hint_data_dictionary = self.get_hint_data_dictionary(hint_processor)?;
        while self.vm.get_pc() != address {
            let hint_data = hint_data_dictionary
                .get(&self.vm.get_pc().offset)
                .map(|datas| datas.as_slice())
                .unwrap_or(&[]);
            self.vm.step(
                hint_processor,
                &mut self.exec_scopes,
                hint_data,
                &self.program.constants,
            )?;
        }
        Ok(())
    }

    /// Freezes segment sizes, computes the relocation table and produces the
    /// relocated memory image and trace.
    pub fn relocate(&mut self) -> Result<(), TraceError> {
        self.vm.segments.compute_effective_sizes();
        let relocation_table = self.vm.segments.relocate_segments()?;
        self.relocate_memory(&relocation_table)?;
        self.relocate_trace(&relocation_table)?;
        Ok(())
    }

    fn relocate_value(
        value: &MaybeRelocatable,
        relocation_table: &[usize],
    ) -> Result<Felt252, MemoryError> {
        match value {
            MaybeRelocatable::Int(num) => Ok(num.clone()),
            MaybeRelocatable::RelocatableValue(rel) => {
                let segment_index: usize = rel.segment_index.try_into().map_err(|_| {
                    MemoryError::AddressInTemporarySegment(rel.segment_index)
                })?;
                if relocation_table.len() <= segment_index {
                    return Err(MemoryError::UnknownMemoryCell(*rel));
                }
                Ok(Felt252::from(relocation_table[segment_index] + rel.offset))
            }
        }
    }

    fn relocate_memory(&mut self, relocation_table: &[usize]) -> Result<(), MemoryError> {
        if !self.relocated_memory.is_empty() {
            return Ok(());
        }
        //The relocated address space starts at 1.
        self.relocated_memory.push(None);
        for (index, segment) in self.vm.segments.memory.data.iter().enumerate() {
            for (offset, cell) in segment.iter().enumerate() {
                match cell {
                    Some(cell) => {
                        let relocated_addr = relocation_table[index] + offset;
                        let value = Self::relocate_value(cell, relocation_table)?;
                        if self.relocated_memory.len() <= relocated_addr {
                            self.relocated_memory.resize(relocated_addr + 1, None);
                        }
                        self.relocated_memory[relocated_addr] = Some(value);
                    }
                    None => self.relocated_memory.push(None),
                }
            }
        }
        Ok(())
    }

    fn relocate_trace(&mut self, relocation_table: &[usize]) -> Result<(), TraceError> {
        if !self.relocated_trace.is_empty() {
            return Ok(());
        }
        for entry in self.vm.trace.iter() {
            self.relocated_trace.push(RelocatedTraceEntry {
                pc: relocate_trace_register(entry.pc, relocation_table)?,
                ap: relocate_trace_register(entry.ap, relocation_table)?,
                fp: relocate_trace_register(entry.fp, relocation_table)?,
            })
        }
        Ok(())
    }

    ///Writes the values of the output builtin's segment, one per line.
    pub fn write_output(&mut self, writer: &mut dyn Write) -> Result<(), RunnerError> {
        let base = match self
            .vm
            .builtin_runners
            .iter()
            .find(|builtin| matches!(builtin, BuiltinRunner::Output(_)))
        {
            Some(builtin) => builtin.base(),
            None => return Ok(()),
        };
        let mut offset = 0;
        while let Some(cell) = self
            .vm
            .segments
            .memory
            .get(&Relocatable::from((base as isize, offset)))
        {
            writeln!(writer, "{}", cell).map_err(|_| RunnerError::WriteFail)?;
            offset += 1;
        }
        Ok(())
    }

    pub fn get_program(&self) -> &Program {
        &self.program
    }

    ///The end sentinel the run stops at, once the runner is initialized.
    pub fn get_final_pc(&self) -> Option<Relocatable> {
        self.final_pc
    }
}
