use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::hint_processor::builtin_hint_processor::dict_manager::DictManager;
use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_maybe_relocatable_from_var_name, get_ptr_from_var_name, insert_value_from_var_name,
    insert_value_into_ap,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::exec_scope::ExecutionScopes;
use crate::types::relocatable::MaybeRelocatable;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

//The Cairo DictAccess struct has three members (key, prev_value, new_value).
pub const DICT_ACCESS_SIZE: usize = 3;

fn copy_initial_dict(
    exec_scopes: &mut ExecutionScopes,
) -> Option<HashMap<MaybeRelocatable, MaybeRelocatable>> {
    exec_scopes
        .get::<HashMap<MaybeRelocatable, MaybeRelocatable>>("initial_dict")
        .ok()
}

///Fetches the dict manager from scopes, creating it lazily on first use.
fn get_or_create_dict_manager(
    exec_scopes: &mut ExecutionScopes,
) -> Rc<RefCell<DictManager>> {
    match exec_scopes.get_dict_manager() {
        Ok(dict_manager) => dict_manager,
        Err(_) => {
            let dict_manager = Rc::new(RefCell::new(DictManager::new()));
            exec_scopes.insert_value("__dict_manager", Rc::clone(&dict_manager));
            dict_manager
        }
    }
}

//Implements hint:
// if '__dict_manager' not in globals():
//     from starkware.cairo.common.dict import DictManager
//     __dict_manager = DictManager()
//
// memory[ap] = __dict_manager.new_dict(segments, initial_dict)
// del initial_dict
pub fn dict_new(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
) -> Result<(), HintError> {
    let initial_dict = copy_initial_dict(exec_scopes)
        .ok_or_else(|| HintError::VariableNotInScope("initial_dict".to_string()))?;
    exec_scopes.delete_variable("initial_dict");
    let dict_manager = get_or_create_dict_manager(exec_scopes);
    let base = dict_manager.borrow_mut().new_dict(vm, initial_dict)?;
    insert_value_into_ap(vm, base)
}

//Implements hint:
// if '__dict_manager' not in globals():
//     from starkware.cairo.common.dict import DictManager
//     __dict_manager = DictManager()
//
// memory[ap] = __dict_manager.new_default_dict(segments, ids.default_value)
pub fn default_dict_new(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let default_value =
        get_maybe_relocatable_from_var_name("default_value", vm, ids_data, ap_tracking)?;
    let initial_dict = copy_initial_dict(exec_scopes);
    let dict_manager = get_or_create_dict_manager(exec_scopes);
    let base = dict_manager
        .borrow_mut()
        .new_default_dict(vm, &default_value, initial_dict)?;
    insert_value_into_ap(vm, base)
}

//Implements hint:
// dict_tracker = __dict_manager.get_tracker(ids.dict_ptr)
// dict_tracker.current_ptr += ids.DictAccess.SIZE
// ids.value = dict_tracker.data[ids.key]
pub fn dict_read(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let key = get_maybe_relocatable_from_var_name("key", vm, ids_data, ap_tracking)?;
    let dict_ptr = get_ptr_from_var_name("dict_ptr", vm, ids_data, ap_tracking)?;
    let dict_manager_ref = exec_scopes.get_dict_manager()?;
    let mut dict = dict_manager_ref.borrow_mut();
    let tracker = dict.get_tracker_mut(dict_ptr)?;
    tracker.current_ptr.offset += DICT_ACCESS_SIZE;
    let value = tracker.get_value(&key)?.clone();
    insert_value_from_var_name("value", value, vm, ids_data, ap_tracking)
}

//Implements hint:
// dict_tracker = __dict_manager.get_tracker(ids.dict_ptr)
// dict_tracker.current_ptr += ids.DictAccess.SIZE
// ids.dict_ptr.prev_value = dict_tracker.data[ids.key]
// dict_tracker.data[ids.key] = ids.new_value
pub fn dict_write(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let key = get_maybe_relocatable_from_var_name("key", vm, ids_data, ap_tracking)?;
    let new_value = get_maybe_relocatable_from_var_name("new_value", vm, ids_data, ap_tracking)?;
    let dict_ptr = get_ptr_from_var_name("dict_ptr", vm, ids_data, ap_tracking)?;
    //dict_ptr points to a DictAccess; prev_value is its second member.
    let dict_ptr_prev_value = dict_ptr + 1_usize;
    let dict_manager_ref = exec_scopes.get_dict_manager()?;
    let mut dict = dict_manager_ref.borrow_mut();
    let tracker = dict.get_tracker_mut(dict_ptr)?;
    tracker.current_ptr.offset += DICT_ACCESS_SIZE;
    let prev_value = tracker.get_value(&key)?.clone();
    tracker.insert_value(&key, &new_value);
    vm.insert_value(dict_ptr_prev_value, prev_value)?;
    Ok(())
}

//Implements hint:
// # Verify dict pointer and prev value.
// dict_tracker = __dict_manager.get_tracker(ids.dict_ptr)
// current_value = dict_tracker.data[ids.key]
// assert current_value == ids.prev_value, \
//     f'Wrong previous value in dict. Got {ids.prev_value}, expected {current_value}.'
//
// # Update value.
// dict_tracker.data[ids.key] = ids.new_value
// dict_tracker.current_ptr += ids.DictAccess.SIZE
pub fn dict_update(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let key = get_maybe_relocatable_from_var_name("key", vm, ids_data, ap_tracking)?;
    let prev_value = get_maybe_relocatable_from_var_name("prev_value", vm, ids_data, ap_tracking)?;
    let new_value = get_maybe_relocatable_from_var_name("new_value", vm, ids_data, ap_tracking)?;
    let dict_ptr = get_ptr_from_var_name("dict_ptr", vm, ids_data, ap_tracking)?;

    let dict_manager_ref = exec_scopes.get_dict_manager()?;
    let mut dict = dict_manager_ref.borrow_mut();
    let tracker = dict.get_tracker_mut(dict_ptr)?;
    let current_value = tracker.get_value(&key)?;
    if current_value != &prev_value {
        return Err(HintError::WrongPrevValue(
            current_value.clone(),
            prev_value,
        ));
    }
    tracker.insert_value(&key, &new_value);
    tracker.current_ptr.offset += DICT_ACCESS_SIZE;
    Ok(())
}
