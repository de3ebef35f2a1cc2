use std::collections::HashMap;

use felt::Felt252;
use lazy_static::lazy_static;

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_relocatable_from_var_name, insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::relocatable::Relocatable;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

lazy_static! {
    // 2^128, the limb boundary of a Uint256.
    static ref SHIFT: Felt252 = Felt252::from(2_u32).pow(128);
}

// A Uint256 is represented by its low and high 128-bit limbs, laid out
// contiguously in memory.
struct Uint256 {
    low: Felt252,
    high: Felt252,
}

impl Uint256 {
    fn from_var_name(
        name: &str,
        vm: &VirtualMachine,
        ids_data: &HashMap<String, HintReference>,
        ap_tracking: &ApTracking,
    ) -> Result<Uint256, HintError> {
        let base_addr = get_relocatable_from_var_name(name, vm, ids_data, ap_tracking)?;
        let low = limb(vm, base_addr, name, "low", 0)?;
        let high = limb(vm, base_addr, name, "high", 1)?;
        Ok(Uint256 { low, high })
    }
}

fn limb(
    vm: &VirtualMachine,
    base_addr: Relocatable,
    name: &str,
    member: &str,
    offset: usize,
) -> Result<Felt252, HintError> {
    vm.get_integer(base_addr + offset).cloned().map_err(|_| {
        HintError::IdentifierHasNoMember(name.to_string(), member.to_string())
    })
}

//Implements hint:
// %{
//     sum_low = ids.a.low + ids.b.low
//     ids.carry_low = 1 if sum_low >= ids.SHIFT else 0
//     sum_high = ids.a.high + ids.b.high + ids.carry_low
//     ids.carry_high = 1 if sum_high >= ids.SHIFT else 0
// %}
pub fn uint256_add(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
    low_only: bool,
) -> Result<(), HintError> {
    let a = Uint256::from_var_name("a", vm, ids_data, ap_tracking)?;
    let b = Uint256::from_var_name("b", vm, ids_data, ap_tracking)?;

    let sum_low = &a.low + &b.low;
    let carry_low = Felt252::from(sum_low >= *SHIFT);

    if !low_only {
        let sum_high = &a.high + &(&b.high + &carry_low);
        let carry_high = Felt252::from(sum_high >= *SHIFT);
        insert_value_from_var_name("carry_high", carry_high, vm, ids_data, ap_tracking)?;
    }

    insert_value_from_var_name("carry_low", carry_low, vm, ids_data, ap_tracking)
}
