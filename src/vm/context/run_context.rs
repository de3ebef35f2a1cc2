use crate::types::instruction::{Instruction, Op1Addr, Register};
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::{memory_errors::MemoryError, vm_errors::VirtualMachineError};

/// The Cairo registers. All three are segment-relative addresses: `pc` points
/// into the program segment, `ap` and `fp` into the execution segment.
pub struct RunContext {
    pub(crate) pc: Relocatable,
    pub(crate) ap: Relocatable,
    pub(crate) fp: Relocatable,
}

impl RunContext {
    pub fn new(pc: Relocatable, ap: Relocatable, fp: Relocatable) -> RunContext {
        RunContext { pc, ap, fp }
    }

    pub fn get_pc(&self) -> Relocatable {
        self.pc
    }

    pub fn get_ap(&self) -> Relocatable {
        self.ap
    }

    pub fn get_fp(&self) -> Relocatable {
        self.fp
    }

    pub fn compute_dst_addr(
        &self,
        instruction: &Instruction,
    ) -> Result<Relocatable, VirtualMachineError> {
        let base_addr = match instruction.dst_register {
            Register::AP => self.ap,
            Register::FP => self.fp,
        };
        apply_offset(base_addr, instruction.off0)
    }

    pub fn compute_op0_addr(
        &self,
        instruction: &Instruction,
    ) -> Result<Relocatable, VirtualMachineError> {
        let base_addr = match instruction.op0_register {
            Register::AP => self.ap,
            Register::FP => self.fp,
        };
        apply_offset(base_addr, instruction.off1)
    }

    pub fn compute_op1_addr(
        &self,
        instruction: &Instruction,
        op0: Option<&MaybeRelocatable>,
    ) -> Result<Relocatable, VirtualMachineError> {
        let base_addr = match instruction.op1_addr {
            Op1Addr::FP => self.fp,
            Op1Addr::AP => self.ap,
            Op1Addr::Imm => match instruction.off2 == 1 {
                true => self.pc,
                false => return Err(VirtualMachineError::ImmShouldBe1),
            },
            Op1Addr::Op0 => match op0 {
                Some(MaybeRelocatable::RelocatableValue(addr)) => *addr,
                Some(_) => return Err(VirtualMachineError::Memory(
                    MemoryError::AddressNotRelocatable,
                )),
                None => return Err(VirtualMachineError::UnknownOp0),
            },
        };
        apply_offset(base_addr, instruction.off2)
    }
}

fn apply_offset(base: Relocatable, offset: isize) -> Result<Relocatable, VirtualMachineError> {
    if offset.is_negative() {
        Ok(base.sub_usize(offset.unsigned_abs())?)
    } else {
        Ok(base + offset.unsigned_abs())
    }
}
