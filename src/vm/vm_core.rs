use std::any::Any;
use std::collections::HashMap;

use felt::Felt252;
use num_traits::Zero;

use crate::hint_processor::hint_processor_definition::HintProcessor;
use crate::types::exec_scope::ExecutionScopes;
use crate::types::instruction::{
    ApUpdate, FpUpdate, Instruction, Opcode, PcUpdate, Res,
};
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::context::run_context::RunContext;
use crate::vm::decoding::decoder::decode_instruction;
use crate::vm::errors::memory_errors::MemoryError;
use crate::vm::errors::vm_errors::VirtualMachineError;
use crate::vm::runners::builtin_runner::{BuiltinRunner, RangeCheckBuiltinRunner};
use crate::vm::trace::trace_entry::TraceEntry;
use crate::vm::vm_memory::memory_segments::MemorySegmentManager;
use crate::relocatable;

#[derive(Debug, PartialEq)]
pub(crate) struct Operands {
    pub(crate) dst: MaybeRelocatable,
    pub(crate) res: Option<MaybeRelocatable>,
    pub(crate) op0: MaybeRelocatable,
    pub(crate) op1: MaybeRelocatable,
}

#[derive(Debug, PartialEq)]
pub(crate) struct OperandsAddresses {
    pub(crate) dst_addr: Relocatable,
    pub(crate) op0_addr: Relocatable,
    pub(crate) op1_addr: Relocatable,
}

#[derive(Default, Debug, PartialEq)]
pub(crate) struct DeducedOperands(u8);

impl DeducedOperands {
    fn set_dst(&mut self) {
        self.0 |= 1;
    }
    fn set_op0(&mut self) {
        self.0 |= 1 << 1;
    }
    fn set_op1(&mut self) {
        self.0 |= 1 << 2;
    }

    fn was_dst_deduced(&self) -> bool {
        self.0 & 1 != 0
    }
    fn was_op0_deduced(&self) -> bool {
        self.0 & (1 << 1) != 0
    }
    fn was_op1_deduced(&self) -> bool {
        self.0 & (1 << 2) != 0
    }
}

pub struct VirtualMachine {
    pub(crate) run_context: RunContext,
    pub segments: MemorySegmentManager,
    pub(crate) builtin_runners: Vec<BuiltinRunner>,
    pub(crate) trace: Vec<TraceEntry>,
    pub(crate) current_step: usize,
}

impl VirtualMachine {
    pub fn new() -> VirtualMachine {
        let run_context = RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 0),
            relocatable!(1, 0),
        );
        VirtualMachine {
            run_context,
            segments: MemorySegmentManager::new(),
            builtin_runners: Vec::new(),
            trace: Vec::new(),
            current_step: 0,
        }
    }

    fn update_fp(
        &mut self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), VirtualMachineError> {
        let new_fp = match instruction.fp_update {
            FpUpdate::APPlus2 => self.run_context.ap + 2_usize,
            FpUpdate::Dst => match &operands.dst {
                MaybeRelocatable::RelocatableValue(rel) => *rel,
                MaybeRelocatable::Int(num) => self.run_context.fp.add_int(num)?,
            },
            FpUpdate::Regular => return Ok(()),
        };
        self.run_context.fp = new_fp;
        Ok(())
    }

    fn update_ap(
        &mut self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), VirtualMachineError> {
        let new_ap = match instruction.ap_update {
            ApUpdate::Add => match &operands.res {
                Some(res) => self.run_context.ap.add_maybe(res)?,
                None => return Err(VirtualMachineError::UnconstrainedResAdd),
            },
            ApUpdate::Add1 => self.run_context.ap + 1_usize,
            ApUpdate::Add2 => self.run_context.ap + 2_usize,
            ApUpdate::Regular => return Ok(()),
        };
        self.run_context.ap = new_ap;
        Ok(())
    }

    fn update_pc(
        &mut self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), VirtualMachineError> {
        let new_pc = match instruction.pc_update {
            PcUpdate::Regular => self.run_context.pc + instruction.size(),
            PcUpdate::Jump => match operands.res.as_ref().and_then(|x| x.get_relocatable()) {
                Some(res) => res,
                None => return Err(VirtualMachineError::UnconstrainedResJump),
            },
            PcUpdate::JumpRel => match &operands.res {
                Some(MaybeRelocatable::Int(num_res)) => self.run_context.pc.add_int(num_res)?,
                Some(MaybeRelocatable::RelocatableValue(_)) => {
                    return Err(VirtualMachineError::PureValueJumpRel)
                }
                None => return Err(VirtualMachineError::UnconstrainedResJumpRel),
            },
            PcUpdate::Jnz => {
                if operands.dst.is_zero() {
                    self.run_context.pc + instruction.size()
                } else {
                    self.run_context.pc.add_maybe(&operands.op1)?
                }
            }
        };
        self.run_context.pc = new_pc;
        Ok(())
    }

    fn update_registers(
        &mut self,
        instruction: &Instruction,
        operands: Operands,
    ) -> Result<(), VirtualMachineError> {
        self.update_fp(instruction, &operands)?;
        self.update_ap(instruction, &operands)?;
        self.update_pc(instruction, &operands)?;
        Ok(())
    }

    ///Returns a tuple (deduced_op0, deduced_res).
    ///Deduces the value of op0 if possible (based on dst and op1).
    ///If res was already deduced, returns its deduced value as well.
    fn deduce_op0(
        &self,
        instruction: &Instruction,
        dst: Option<&MaybeRelocatable>,
        op1: Option<&MaybeRelocatable>,
    ) -> Result<(Option<MaybeRelocatable>, Option<MaybeRelocatable>), VirtualMachineError> {
        match instruction.opcode {
            Opcode::Call => Ok((
                Some(MaybeRelocatable::from(
                    self.run_context.pc + instruction.size(),
                )),
                None,
            )),
            Opcode::AssertEq => match (&instruction.res, dst, op1) {
                (Res::Add, Some(dst_val), Some(op1_val)) => {
                    Ok((Some(dst_val.sub(op1_val)?), dst.cloned()))
                }
                (
                    Res::Mul,
                    Some(MaybeRelocatable::Int(num_dst)),
                    Some(MaybeRelocatable::Int(num_op1)),
                ) if !num_op1.is_zero() => Ok((
                    Some(MaybeRelocatable::Int(num_dst / num_op1)),
                    dst.cloned(),
                )),
                _ => Ok((None, None)),
            },
            _ => Ok((None, None)),
        }
    }

    ///Returns a tuple (deduced_op1, deduced_res).
    ///Deduces the value of op1 if possible (based on dst and op0).
    ///If res was already deduced, returns its deduced value as well.
    fn deduce_op1(
        &self,
        instruction: &Instruction,
        dst: Option<&MaybeRelocatable>,
        op0: Option<&MaybeRelocatable>,
    ) -> Result<(Option<MaybeRelocatable>, Option<MaybeRelocatable>), VirtualMachineError> {
        if let Opcode::AssertEq = instruction.opcode {
            match (&instruction.res, dst, op0) {
                (Res::Op1, Some(dst_val), _) => {
                    return Ok((Some(dst_val.clone()), Some(dst_val.clone())))
                }
                (Res::Add, Some(dst_val), Some(op0_val)) => {
                    return Ok((Some(dst_val.sub(op0_val)?), dst.cloned()))
                }
                (
                    Res::Mul,
                    Some(MaybeRelocatable::Int(num_dst)),
                    Some(MaybeRelocatable::Int(num_op0)),
                ) if !num_op0.is_zero() => {
                    return Ok((
                        Some(MaybeRelocatable::Int(num_dst / num_op0)),
                        dst.cloned(),
                    ))
                }
                _ => (),
            };
        };
        Ok((None, None))
    }

    ///Queries the builtin that owns the segment of the given address, if
    ///any, for a deduced value.
    fn deduce_memory_cell(
        &self,
        address: Relocatable,
    ) -> Result<Option<MaybeRelocatable>, VirtualMachineError> {
        for builtin in self.builtin_runners.iter() {
            if builtin.base() as isize == address.segment_index {
                return builtin
                    .deduce_memory_cell(address, &self.segments.memory)
                    .map_err(VirtualMachineError::RunnerError);
            }
        }
        Ok(None)
    }

    ///Computes the value of res if possible.
    fn compute_res(
        &self,
        instruction: &Instruction,
        op0: &MaybeRelocatable,
        op1: &MaybeRelocatable,
    ) -> Result<Option<MaybeRelocatable>, VirtualMachineError> {
        match instruction.res {
            Res::Op1 => Ok(Some(op1.clone())),
            Res::Add => Ok(Some(op0.add(op1)?)),
            Res::Mul => {
                if let (MaybeRelocatable::Int(num_op0), MaybeRelocatable::Int(num_op1)) =
                    (op0, op1)
                {
                    return Ok(Some(MaybeRelocatable::Int(num_op0 * num_op1)));
                }
                Err(VirtualMachineError::ComputeResRelocatableMul(
                    op0.clone(),
                    op1.clone(),
                ))
            }
            Res::Unconstrained => Ok(None),
        }
    }

    fn deduce_dst(
        &self,
        instruction: &Instruction,
        res: &Option<MaybeRelocatable>,
    ) -> Result<MaybeRelocatable, VirtualMachineError> {
        match (&instruction.opcode, res) {
            (Opcode::AssertEq, Some(res)) => Ok(res.clone()),
            (Opcode::Call, _) => Ok(MaybeRelocatable::from(self.run_context.fp)),
            _ => Err(VirtualMachineError::NoDst),
        }
    }

    fn opcode_assertions(
        &self,
        instruction: &Instruction,
        operands: &Operands,
    ) -> Result<(), VirtualMachineError> {
        match instruction.opcode {
            Opcode::AssertEq => match &operands.res {
                None => Err(VirtualMachineError::UnconstrainedResAssertEq),
                Some(res) if res != &operands.dst => Err(VirtualMachineError::DiffAssertValues(
                    res.clone(),
                    operands.dst.clone(),
                )),
                _ => Ok(()),
            },
            Opcode::Call => {
                let return_pc =
                    MaybeRelocatable::from(self.run_context.pc + instruction.size());
                if operands.op0 != return_pc {
                    return Err(VirtualMachineError::CantWriteReturnPc(
                        operands.op0.clone(),
                        return_pc,
                    ));
                };
                let return_fp = MaybeRelocatable::from(self.run_context.fp);
                if operands.dst != return_fp {
                    return Err(VirtualMachineError::CantWriteReturnFp(
                        operands.dst.clone(),
                        return_fp,
                    ));
                };
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Writes deduced operands back; write-once memory enforces consistency
    /// with anything a hint already put there.
    fn insert_deduced_operands(
        &mut self,
        deduced_operands: DeducedOperands,
        operands: &Operands,
        operands_addresses: &OperandsAddresses,
    ) -> Result<(), VirtualMachineError> {
        if deduced_operands.was_op0_deduced() {
            self.segments
                .memory
                .insert(operands_addresses.op0_addr, &operands.op0)?;
        }
        if deduced_operands.was_op1_deduced() {
            self.segments
                .memory
                .insert(operands_addresses.op1_addr, &operands.op1)?;
        }
        if deduced_operands.was_dst_deduced() {
            self.segments
                .memory
                .insert(operands_addresses.dst_addr, &operands.dst)?;
        }
        Ok(())
    }

    fn run_instruction(&mut self, instruction: &Instruction) -> Result<(), VirtualMachineError> {
        let (operands, operands_addresses, deduced_operands) =
            self.compute_operands(instruction)?;
        self.insert_deduced_operands(deduced_operands, &operands, &operands_addresses)?;
        self.opcode_assertions(instruction, &operands)?;

        self.trace.push(TraceEntry {
            pc: self.run_context.pc,
            ap: self.run_context.ap,
            fp: self.run_context.fp,
        });

        self.update_registers(instruction, operands)?;
        self.current_step += 1;
        Ok(())
    }

    fn decode_current_instruction(&self) -> Result<Instruction, VirtualMachineError> {
        let cell = self
            .segments
            .memory
            .get(&self.run_context.pc)
            .ok_or(MemoryError::UnknownMemoryCell(self.run_context.pc))?;
        let encoded = match cell {
            MaybeRelocatable::Int(encoded) => encoded,
            value => {
                return Err(VirtualMachineError::InvalidInstructionEncoding(
                    value.clone(),
                ))
            }
        };
        let word = encoded
            .to_u64()
            .ok_or_else(|| VirtualMachineError::InvalidInstruction(encoded.clone()))?;
        let imm = self
            .segments
            .memory
            .get(&(self.run_context.pc + 1_usize))
            .and_then(MaybeRelocatable::get_int_ref);
        decode_instruction(word, imm)
    }

    /// Executes the hints attached to the current pc, in order.
    pub fn step_hint(
        &mut self,
        hint_processor: &dyn HintProcessor,
        exec_scopes: &mut ExecutionScopes,
        hint_datas: &[Box<dyn Any>],
        constants: &HashMap<String, Felt252>,
    ) -> Result<(), VirtualMachineError> {
        for (hint_index, hint_data) in hint_datas.iter().enumerate() {
            hint_processor
                .execute_hint(self, exec_scopes, hint_data, constants)
                .map_err(|err| VirtualMachineError::Hint(hint_index, Box::new(err)))?
        }
        Ok(())
    }

    pub fn step_instruction(&mut self) -> Result<(), VirtualMachineError> {
        let instruction = self.decode_current_instruction()?;
        self.run_instruction(&instruction)
    }

    pub fn step(
        &mut self,
        hint_processor: &dyn HintProcessor,
        exec_scopes: &mut ExecutionScopes,
        hint_datas: &[Box<dyn Any>],
        constants: &HashMap<String, Felt252>,
    ) -> Result<(), VirtualMachineError> {
        self.step_hint(hint_processor, exec_scopes, hint_datas, constants)?;
        self.step_instruction()
    }

    fn compute_op0_deductions(
        &self,
        op0_addr: Relocatable,
        res: &mut Option<MaybeRelocatable>,
        instruction: &Instruction,
        dst_op: &Option<MaybeRelocatable>,
        op1_op: &Option<MaybeRelocatable>,
    ) -> Result<MaybeRelocatable, VirtualMachineError> {
        let op0_op = match self.deduce_memory_cell(op0_addr)? {
            None => {
                let op0;
                (op0, *res) = self.deduce_op0(instruction, dst_op.as_ref(), op1_op.as_ref())?;
                op0
            }
            deduced_memory_cell => deduced_memory_cell,
        };
        op0_op.ok_or(VirtualMachineError::FailedToComputeOperands(
            "op0".to_string(),
            op0_addr,
        ))
    }

    fn compute_op1_deductions(
        &self,
        op1_addr: Relocatable,
        res: &mut Option<MaybeRelocatable>,
        instruction: &Instruction,
        dst_op: &Option<MaybeRelocatable>,
        op0: &MaybeRelocatable,
    ) -> Result<MaybeRelocatable, VirtualMachineError> {
        let op1_op = match self.deduce_memory_cell(op1_addr)? {
            None => {
                let (op1, deduced_res) =
                    self.deduce_op1(instruction, dst_op.as_ref(), Some(op0))?;
                if res.is_none() {
                    *res = deduced_res
                }
                op1
            }
            deduced_memory_cell => deduced_memory_cell,
        };
        op1_op.ok_or(VirtualMachineError::FailedToComputeOperands(
            "op1".to_string(),
            op1_addr,
        ))
    }

    /// Computes operands and res. A missing operand is deduced: first by the
    /// builtin owning its segment, then from the instruction semantics.
    pub(crate) fn compute_operands(
        &self,
        instruction: &Instruction,
    ) -> Result<(Operands, OperandsAddresses, DeducedOperands), VirtualMachineError> {
        let dst_addr = self.run_context.compute_dst_addr(instruction)?;
        let dst_op = self.segments.memory.get(&dst_addr).cloned();

        let op0_addr = self.run_context.compute_op0_addr(instruction)?;
        let op0_op = self.segments.memory.get(&op0_addr).cloned();

        let op1_addr = self
            .run_context
            .compute_op1_addr(instruction, op0_op.as_ref())?;
        let op1_op = self.segments.memory.get(&op1_addr).cloned();

        let mut res: Option<MaybeRelocatable> = None;
        let mut deduced_operands = DeducedOperands::default();

        let op0 = match op0_op {
            Some(op0) => op0,
            None => {
                deduced_operands.set_op0();
                self.compute_op0_deductions(op0_addr, &mut res, instruction, &dst_op, &op1_op)?
            }
        };

        let op1 = match op1_op {
            Some(op1) => op1,
            None => {
                deduced_operands.set_op1();
                self.compute_op1_deductions(op1_addr, &mut res, instruction, &dst_op, &op0)?
            }
        };

        if res.is_none() {
            res = self.compute_res(instruction, &op0, &op1)?;
        }

        let dst = match dst_op {
            Some(dst) => dst,
            None => {
                deduced_operands.set_dst();
                self.deduce_dst(instruction, &res)?
            }
        };

        Ok((
            Operands { dst, res, op0, op1 },
            OperandsAddresses {
                dst_addr,
                op0_addr,
                op1_addr,
            },
            deduced_operands,
        ))
    }

    ///Makes sure that all assigned memory cells are consistent with their
    ///auto deduction rules.
    pub fn verify_auto_deductions(&self) -> Result<(), VirtualMachineError> {
        for builtin in self.builtin_runners.iter() {
            let index = builtin.base();
            for (offset, value) in self.segments.memory.data[index].iter().enumerate() {
                let address = Relocatable::from((index as isize, offset));
                if let Some(deduced_memory_cell) = builtin
                    .deduce_memory_cell(address, &self.segments.memory)
                    .map_err(VirtualMachineError::RunnerError)?
                {
                    if value.is_some() && value.as_ref() != Some(&deduced_memory_cell) {
                        return Err(VirtualMachineError::InconsistentAutoDeduction(
                            builtin.name(),
                            deduced_memory_cell,
                            value.clone(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get_pc(&self) -> Relocatable {
        self.run_context.get_pc()
    }

    pub fn get_ap(&self) -> Relocatable {
        self.run_context.get_ap()
    }

    pub fn get_fp(&self) -> Relocatable {
        self.run_context.get_fp()
    }

    pub fn get_current_step(&self) -> usize {
        self.current_step
    }

    pub fn get_trace(&self) -> &Vec<TraceEntry> {
        &self.trace
    }

    pub fn add_memory_segment(&mut self) -> Relocatable {
        self.segments.add()
    }

    pub fn add_temporary_segment(&mut self) -> Relocatable {
        self.segments.add_temporary_segment()
    }

    pub fn get_integer(&self, key: Relocatable) -> Result<&Felt252, MemoryError> {
        self.segments.memory.get_integer(key)
    }

    pub fn get_relocatable(&self, key: Relocatable) -> Result<Relocatable, MemoryError> {
        self.segments.memory.get_relocatable(key)
    }

    pub fn get_maybe(&self, key: &Relocatable) -> Option<MaybeRelocatable> {
        self.segments.memory.get(key).cloned()
    }

    pub fn insert_value<T: Into<MaybeRelocatable>>(
        &mut self,
        key: Relocatable,
        val: T,
    ) -> Result<(), MemoryError> {
        self.segments.memory.insert(key, val.into())
    }

    pub fn load_data(
        &mut self,
        ptr: Relocatable,
        data: &[MaybeRelocatable],
    ) -> Result<Relocatable, MemoryError> {
        self.segments.load_data(ptr, data)
    }

    pub fn get_integer_range(
        &self,
        addr: Relocatable,
        size: usize,
    ) -> Result<Vec<Felt252>, MemoryError> {
        self.segments.memory.get_integer_range(addr, size)
    }

    pub fn mem_eq(&self, lhs: Relocatable, rhs: Relocatable, len: usize) -> bool {
        self.segments.memory.mem_eq(lhs, rhs, len)
    }

    pub fn get_builtin_runners(&self) -> &Vec<BuiltinRunner> {
        &self.builtin_runners
    }

    pub fn get_range_check_builtin(
        &self,
    ) -> Result<&RangeCheckBuiltinRunner, VirtualMachineError> {
        for builtin in &self.builtin_runners {
            if let BuiltinRunner::RangeCheck(range_check_builtin) = builtin {
                return Ok(range_check_builtin);
            };
        }
        Err(VirtualMachineError::NoRangeCheckBuiltin)
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint_processor::builtin_hint_processor::builtin_hint_processor_definition::BuiltinHintProcessor;
    use crate::types::instruction::{Op1Addr, Register};
    use crate::utils::test_utils::*;
    use crate::vm::runners::builtin_runner::HashBuiltinRunner;
    use crate::mayberelocatable;
    use assert_matches::assert_matches;
    use felt::felt_str;

    fn instruction() -> Instruction {
        Instruction {
            off0: 1,
            off1: 2,
            off2: 3,
            imm: None,
            dst_register: Register::FP,
            op0_register: Register::AP,
            op1_addr: Op1Addr::AP,
            res: Res::Add,
            pc_update: PcUpdate::Regular,
            ap_update: ApUpdate::Regular,
            fp_update: FpUpdate::Regular,
            opcode: Opcode::NOp,
        }
    }

    fn operands() -> Operands {
        Operands {
            dst: mayberelocatable!(11),
            res: Some(mayberelocatable!(8)),
            op0: mayberelocatable!(9),
            op1: mayberelocatable!(10),
        }
    }

    #[test]
    fn update_fp_ap_plus_2() {
        let mut instruction = instruction();
        instruction.fp_update = FpUpdate::APPlus2;
        let mut vm = vm!();
        vm.run_context = RunContext::new(relocatable!(0, 4), relocatable!(1, 5), relocatable!(1, 6));
        vm.update_fp(&instruction, &operands()).unwrap();
        assert_eq!(vm.run_context.fp, relocatable!(1, 7));
    }

    #[test]
    fn update_fp_dst_relocatable() {
        let mut instruction = instruction();
        instruction.fp_update = FpUpdate::Dst;
        let mut operands = operands();
        operands.dst = mayberelocatable!(1, 11);
        let mut vm = vm!();
        vm.update_fp(&instruction, &operands).unwrap();
        assert_eq!(vm.run_context.fp, relocatable!(1, 11));
    }

    #[test]
    fn update_fp_dst_felt_offsets_fp() {
        let mut instruction = instruction();
        instruction.fp_update = FpUpdate::Dst;
        let mut vm = vm!();
        vm.run_context = RunContext::new(relocatable!(0, 4), relocatable!(1, 5), relocatable!(1, 6));
        vm.update_fp(&instruction, &operands()).unwrap();
        assert_eq!(vm.run_context.fp, relocatable!(1, 17));
    }

    #[test]
    fn update_ap_add_with_res() {
        let mut instruction = instruction();
        instruction.ap_update = ApUpdate::Add;
        let mut vm = vm!();
        vm.run_context = RunContext::new(relocatable!(0, 4), relocatable!(1, 5), relocatable!(1, 6));
        vm.update_ap(&instruction, &operands()).unwrap();
        assert_eq!(vm.run_context.ap, relocatable!(1, 13));
    }

    #[test]
    fn update_ap_add_without_res_fails() {
        let mut instruction = instruction();
        instruction.ap_update = ApUpdate::Add;
        let mut operands = operands();
        operands.res = None;
        let mut vm = vm!();
        assert_matches!(
            vm.update_ap(&instruction, &operands),
            Err(VirtualMachineError::UnconstrainedResAdd)
        );
    }

    #[test]
    fn update_pc_regular_advances_by_size() {
        let mut vm = vm!();
        vm.update_pc(&instruction(), &operands()).unwrap();
        assert_eq!(vm.run_context.pc, relocatable!(0, 1));
    }

    #[test]
    fn update_pc_jump_needs_relocatable_res() {
        let mut instruction = instruction();
        instruction.pc_update = PcUpdate::Jump;
        let mut vm = vm!();
        assert_matches!(
            vm.update_pc(&instruction, &operands()),
            Err(VirtualMachineError::UnconstrainedResJump)
        );
        let mut operands = operands();
        operands.res = Some(mayberelocatable!(0, 5));
        vm.update_pc(&instruction, &operands).unwrap();
        assert_eq!(vm.run_context.pc, relocatable!(0, 5));
    }

    #[test]
    fn update_pc_jump_rel_needs_felt_res() {
        let mut instruction = instruction();
        instruction.pc_update = PcUpdate::JumpRel;
        let mut vm = vm!();
        let mut operands = operands();
        operands.res = Some(mayberelocatable!(0, 5));
        assert_matches!(
            vm.update_pc(&instruction, &operands),
            Err(VirtualMachineError::PureValueJumpRel)
        );
        operands.res = Some(mayberelocatable!(5));
        vm.update_pc(&instruction, &operands).unwrap();
        assert_eq!(vm.run_context.pc, relocatable!(0, 5));
    }

    #[test]
    fn update_pc_jnz_dst_zero_advances() {
        let mut instruction = instruction();
        instruction.pc_update = PcUpdate::Jnz;
        let mut operands = operands();
        operands.dst = mayberelocatable!(0);
        let mut vm = vm!();
        vm.update_pc(&instruction, &operands).unwrap();
        assert_eq!(vm.run_context.pc, relocatable!(0, 1));
    }

    #[test]
    fn update_pc_jnz_dst_nonzero_jumps_by_op1() {
        let mut instruction = instruction();
        instruction.pc_update = PcUpdate::Jnz;
        let mut vm = vm!();
        vm.update_pc(&instruction, &operands()).unwrap();
        assert_eq!(vm.run_context.pc, relocatable!(0, 10));
    }

    #[test]
    fn deduce_op0_for_call_is_return_pc() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::Call;
        let vm = vm!();
        let (op0, res) = vm.deduce_op0(&instruction, None, None).unwrap();
        assert_eq!(op0, Some(mayberelocatable!(0, 1)));
        assert_eq!(res, None);
    }

    #[test]
    fn deduce_op0_assert_eq_add() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        let vm = vm!();
        let (op0, res) = vm
            .deduce_op0(
                &instruction,
                Some(&mayberelocatable!(7)),
                Some(&mayberelocatable!(4)),
            )
            .unwrap();
        assert_eq!(op0, Some(mayberelocatable!(3)));
        assert_eq!(res, Some(mayberelocatable!(7)));
    }

    #[test]
    fn deduce_op0_assert_eq_mul_divides() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.res = Res::Mul;
        let vm = vm!();
        let (op0, res) = vm
            .deduce_op0(
                &instruction,
                Some(&mayberelocatable!(8)),
                Some(&mayberelocatable!(2)),
            )
            .unwrap();
        assert_eq!(op0, Some(mayberelocatable!(4)));
        assert_eq!(res, Some(mayberelocatable!(8)));
    }

    #[test]
    fn deduce_op0_assert_eq_mul_by_zero_deduces_nothing() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.res = Res::Mul;
        let vm = vm!();
        let (op0, res) = vm
            .deduce_op0(
                &instruction,
                Some(&mayberelocatable!(8)),
                Some(&mayberelocatable!(0)),
            )
            .unwrap();
        assert_eq!(op0, None);
        assert_eq!(res, None);
    }

    #[test]
    fn deduce_op1_assert_eq_op1_copies_dst() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.res = Res::Op1;
        let vm = vm!();
        let (op1, res) = vm
            .deduce_op1(&instruction, Some(&mayberelocatable!(7)), None)
            .unwrap();
        assert_eq!(op1, Some(mayberelocatable!(7)));
        assert_eq!(res, Some(mayberelocatable!(7)));
    }

    #[test]
    fn compute_res_mul_with_address_fails() {
        let mut instruction = instruction();
        instruction.res = Res::Mul;
        let vm = vm!();
        assert_matches!(
            vm.compute_res(&instruction, &mayberelocatable!(1, 2), &mayberelocatable!(2)),
            Err(VirtualMachineError::ComputeResRelocatableMul(_, _))
        );
    }

    #[test]
    fn deduce_dst_no_rule_fails() {
        let vm = vm!();
        assert_matches!(
            vm.deduce_dst(&instruction(), &None),
            Err(VirtualMachineError::NoDst)
        );
    }

    #[test]
    fn opcode_assertion_assert_eq_mismatch() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        let mut operands = operands();
        operands.res = Some(mayberelocatable!(9));
        let vm = vm!();
        assert_matches!(
            vm.opcode_assertions(&instruction, &operands),
            Err(VirtualMachineError::DiffAssertValues(_, _))
        );
    }

    #[test]
    fn opcode_assertion_call_checks_return_pc_and_fp() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::Call;
        let vm = vm!();
        assert_matches!(
            vm.opcode_assertions(&instruction, &operands()),
            Err(VirtualMachineError::CantWriteReturnPc(_, _))
        );
        let mut operands = operands();
        operands.op0 = mayberelocatable!(0, 1);
        operands.dst = mayberelocatable!(7);
        assert_matches!(
            vm.opcode_assertions(&instruction, &operands),
            Err(VirtualMachineError::CantWriteReturnFp(_, _))
        );
    }

    #[test]
    fn compute_operands_add_ap() {
        let mut instruction = instruction();
        instruction.off0 = 0;
        instruction.off1 = 1;
        instruction.off2 = 2;
        instruction.dst_register = Register::AP;
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 5), ((1, 1), 2), ((1, 2), 3)];
        let (operands, addresses, deduced) = vm.compute_operands(&instruction).unwrap();
        assert_eq!(operands.dst, mayberelocatable!(5));
        assert_eq!(operands.op0, mayberelocatable!(2));
        assert_eq!(operands.op1, mayberelocatable!(3));
        assert_eq!(operands.res, Some(mayberelocatable!(5)));
        assert_eq!(addresses.dst_addr, relocatable!(1, 0));
        assert_eq!(deduced, DeducedOperands::default());
    }

    #[test]
    fn compute_operands_deduces_dst_from_res() {
        // assert [ap] = [ap - 2] + [ap - 1], with [ap] unknown.
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.off0 = 2;
        instruction.off1 = 0;
        instruction.off2 = 1;
        instruction.dst_register = Register::AP;
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 2), ((1, 1), 3)];
        let (operands, _, deduced) = vm.compute_operands(&instruction).unwrap();
        assert_eq!(operands.dst, mayberelocatable!(5));
        assert!(deduced.was_dst_deduced());
    }

    #[test]
    fn compute_operands_deduces_op1_from_dst_and_op0() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.off0 = 0;
        instruction.off1 = 1;
        instruction.off2 = 2;
        instruction.dst_register = Register::AP;
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 9), ((1, 1), 5)];
        let (operands, _, deduced) = vm.compute_operands(&instruction).unwrap();
        assert_eq!(operands.op1, mayberelocatable!(4));
        assert!(deduced.was_op1_deduced());
        // The deduced operand is persisted by run_instruction.
    }

    #[test]
    fn compute_operands_consults_builtin_deduction() {
        let mut instruction = instruction();
        instruction.opcode = Opcode::AssertEq;
        instruction.res = Res::Op1;
        instruction.off0 = 0;
        instruction.off1 = 1;
        instruction.off2 = 2;
        instruction.dst_register = Register::AP;
        instruction.op1_addr = Op1Addr::FP;

        let mut vm = vm!();
        // Segment 0: program (unused); segment 1: execution; segment 2: pedersen.
        vm.segments = segments![((1, 1), 0), ((2, 0), 32), ((2, 1), 72)];
        let mut builtin = HashBuiltinRunner::new(true);
        let mut scratch = MemorySegmentManager::new();
        scratch.add();
        scratch.add();
        builtin.initialize_segments(&mut scratch);
        vm.builtin_runners.push(builtin.into());

        // fp points at the pedersen output cell.
        vm.run_context = RunContext::new(relocatable!(0, 0), relocatable!(1, 0), relocatable!(2, 0));
        let (operands, _, deduced) = vm.compute_operands(&instruction).unwrap();
        assert!(deduced.was_op1_deduced());
        assert_eq!(
            operands.op1,
            MaybeRelocatable::Int(felt_str!(
                "3270867057177188607814717243084834301278723532952411121381966378910183338911"
            ))
        );
    }

    #[test]
    fn step_runs_attached_hint_before_the_instruction() {
        use crate::hint_processor::builtin_hint_processor::builtin_hint_processor_definition::HintProcessorData;
        use crate::hint_processor::builtin_hint_processor::hint_code;

        let mut vm = vm!();
        // A no-op instruction whose three operands all read [ap]; the cell
        // only exists because the hint wrote it at step entry.
        vm.segments = segments![((0, 0), 0x0010800080008000_i64)];
        vm.segments.add();
        vm.run_context = RunContext::new(relocatable!(0, 0), relocatable!(1, 0), relocatable!(1, 0));

        let hint_processor = BuiltinHintProcessor::new_empty();
        let hint_data = crate::any_box!(HintProcessorData::new_default(
            hint_code::ADD_SEGMENT.to_string(),
            HashMap::new(),
        ));
        vm.step(
            &hint_processor,
            &mut ExecutionScopes::new(),
            &[hint_data],
            &HashMap::new(),
        )
        .unwrap();
        // The hint allocated segment 2 and wrote its base at [ap].
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 0)),
            Some(&mayberelocatable!(2, 0))
        );
        assert_eq!(vm.trace.len(), 1);
        assert_eq!(vm.current_step, 1);
    }

    #[test]
    fn trace_entry_per_step() {
        let mut vm = vm!();
        // [ap] = 5; ap++  after an initial stack of (return_fp, end).
        vm.segments = segments![
            ((0, 0), 0x480680017FFF8000_i64),
            ((0, 1), 5),
            ((1, 0), (2, 0)),
            ((1, 1), (3, 0))
        ];
        vm.run_context = RunContext::new(relocatable!(0, 0), relocatable!(1, 2), relocatable!(1, 2));
        vm.step_instruction().unwrap();
        assert_eq!(
            vm.trace,
            vec![TraceEntry {
                pc: relocatable!(0, 0),
                ap: relocatable!(1, 2),
                fp: relocatable!(1, 2),
            }]
        );
        assert_eq!(vm.run_context.pc, relocatable!(0, 2));
        assert_eq!(vm.run_context.ap, relocatable!(1, 3));
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 2)),
            Some(&mayberelocatable!(5))
        );
    }
}
