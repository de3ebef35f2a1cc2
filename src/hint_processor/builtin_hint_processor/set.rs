use std::collections::HashMap;

use felt::Felt252;
use num_traits::{One, Zero};

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_integer_from_var_name, get_ptr_from_var_name, insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

pub fn set_add(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let set_ptr = get_ptr_from_var_name("set_ptr", vm, ids_data, ap_tracking)?;
    let elm_size_felt = get_integer_from_var_name("elm_size", vm, ids_data, ap_tracking)?;
    let elm_ptr = get_ptr_from_var_name("elm_ptr", vm, ids_data, ap_tracking)?;
    let set_end_ptr = get_ptr_from_var_name("set_end_ptr", vm, ids_data, ap_tracking)?;

    let elm_size = elm_size_felt
        .to_usize()
        .ok_or_else(|| HintError::ValueOutOfRange(elm_size_felt.clone()))?;
    if elm_size.is_zero() {
        return Err(HintError::AssertionFailed(
            "assert ids.elm_size > 0".to_string(),
        ));
    }
    if set_ptr > set_end_ptr {
        return Err(HintError::InvalidSetRange(set_ptr, set_end_ptr));
    }

    let n_elms = set_end_ptr.sub(&set_ptr)? / elm_size;
    for i in 0..n_elms {
        if vm.mem_eq(elm_ptr, set_ptr + elm_size * i, elm_size) {
            insert_value_from_var_name("index", Felt252::from(i), vm, ids_data, ap_tracking)?;
            return insert_value_from_var_name(
                "is_elm_in_set",
                Felt252::one(),
                vm,
                ids_data,
                ap_tracking,
            );
        }
    }
    insert_value_from_var_name("is_elm_in_set", Felt252::zero(), vm, ids_data, ap_tracking)
}
