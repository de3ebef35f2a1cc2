use crate::serde::deserialize_program::ApTracking;
use crate::types::instruction::Register;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::vm_core::VirtualMachine;

use super::hint_processor_definition::HintReference;

///Returns the value given by a reference as a MaybeRelocatable; None if it
///cannot be resolved against the current register state and memory.
pub fn get_maybe_relocatable_from_reference(
    vm: &VirtualMachine,
    hint_reference: &HintReference,
    ap_tracking: &ApTracking,
) -> Option<MaybeRelocatable> {
    //An immediate reference carries its value in the expression itself.
    if hint_reference.register.is_none() {
        return Some(MaybeRelocatable::Int(
            hint_reference.immediate.as_ref()?.clone(),
        ));
    }
    let var_addr = compute_addr_from_reference(hint_reference, vm, ap_tracking)?;
    if hint_reference.dereference {
        vm.get_maybe(&var_addr)
    } else {
        Some(MaybeRelocatable::from(var_addr))
    }
}

///Computes the memory address the reference expression points at, applying
///the ap-tracking correction when the base register is ap.
pub fn compute_addr_from_reference(
    hint_reference: &HintReference,
    vm: &VirtualMachine,
    hint_ap_tracking: &ApTracking,
) -> Option<Relocatable> {
    let base_addr = match hint_reference.register {
        Some(Register::FP) => vm.get_fp(),
        Some(Register::AP) => apply_ap_tracking_correction(
            vm.get_ap(),
            hint_reference.ap_tracking_data.as_ref()?,
            hint_ap_tracking,
        )?,
        None => return None,
    };
    let addr = add_offset(base_addr, hint_reference.offset1)?;
    if hint_reference.inner_dereference {
        let dereferenced_addr = vm.get_relocatable(addr).ok()?;
        if let Some(imm) = &hint_reference.immediate {
            return dereferenced_addr.add_int(imm).ok();
        }
        return add_offset(dereferenced_addr, hint_reference.offset2);
    }
    add_offset(addr, hint_reference.offset2)
}

fn add_offset(base: Relocatable, offset: i32) -> Option<Relocatable> {
    if offset.is_negative() {
        base.sub_usize(offset.unsigned_abs() as usize).ok()
    } else {
        Some(base + offset.unsigned_abs() as usize)
    }
}

fn apply_ap_tracking_correction(
    ap: Relocatable,
    ref_ap_tracking: &ApTracking,
    hint_ap_tracking: &ApTracking,
) -> Option<Relocatable> {
    // Both must belong to the same tracking group for the correction to
    // be meaningful.
    if ref_ap_tracking.group != hint_ap_tracking.group {
        return None;
    }
    let ap_diff = hint_ap_tracking.offset.checked_sub(ref_ap_tracking.offset)?;
    ap.sub_usize(ap_diff).ok()
}
