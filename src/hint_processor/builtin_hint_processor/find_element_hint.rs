use std::collections::HashMap;

use felt::Felt252;

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_integer_from_var_name, get_ptr_from_var_name, insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::exec_scope::ExecutionScopes;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

pub fn find_element(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let key = get_integer_from_var_name("key", vm, ids_data, ap_tracking)?;
    let elm_size_felt = get_integer_from_var_name("elm_size", vm, ids_data, ap_tracking)?;
    let n_elms = get_integer_from_var_name("n_elms", vm, ids_data, ap_tracking)?;
    let array_start = get_ptr_from_var_name("array_ptr", vm, ids_data, ap_tracking)?;
    let elm_size = elm_size_felt
        .to_usize()
        .filter(|size| *size != 0)
        .ok_or(HintError::ValueOutOfRange(elm_size_felt))?;

    if let Ok(find_element_index) = exec_scopes.get::<Felt252>("find_element_index") {
        let index = find_element_index
            .to_usize()
            .ok_or_else(|| HintError::ValueOutOfRange(find_element_index.clone()))?;
        let found_key = vm
            .get_integer(array_start + elm_size * index)
            .map_err(|_| HintError::NoValueForKeyFindElement(key.clone()))?;
        if found_key != &key {
            return Err(HintError::InvalidIndex(
                find_element_index,
                key,
                found_key.clone(),
            ));
        }
        insert_value_from_var_name("index", find_element_index, vm, ids_data, ap_tracking)?;
        exec_scopes.delete_variable("find_element_index");
        return Ok(());
    }

    if let Ok(find_element_max_size) = exec_scopes.get_ref::<Felt252>("find_element_max_size") {
        if &n_elms > find_element_max_size {
            return Err(HintError::FindElemMaxSize(
                find_element_max_size.clone(),
                n_elms,
            ));
        }
    }
    let n_elms_iter = n_elms
        .to_usize()
        .ok_or_else(|| HintError::ValueOutOfRange(n_elms.clone()))?;
    for i in 0..n_elms_iter {
        let iter_key = vm
            .get_integer(array_start + elm_size * i)
            .map_err(|_| HintError::NoValueForKeyFindElement(key.clone()))?;
        if iter_key == &key {
            return insert_value_from_var_name(
                "index",
                Felt252::from(i),
                vm,
                ids_data,
                ap_tracking,
            );
        }
    }
    Err(HintError::NoValueForKeyFindElement(key))
}

pub fn search_sorted_lower(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let key = get_integer_from_var_name("key", vm, ids_data, ap_tracking)?;
    let elm_size_felt = get_integer_from_var_name("elm_size", vm, ids_data, ap_tracking)?;
    let n_elms = get_integer_from_var_name("n_elms", vm, ids_data, ap_tracking)?;
    let array_start = get_ptr_from_var_name("array_ptr", vm, ids_data, ap_tracking)?;
    let elm_size = elm_size_felt
        .to_usize()
        .filter(|size| *size != 0)
        .ok_or(HintError::ValueOutOfRange(elm_size_felt))?;

    if let Ok(find_element_max_size) = exec_scopes.get_ref::<Felt252>("find_element_max_size") {
        if &n_elms > find_element_max_size {
            return Err(HintError::FindElemMaxSize(
                find_element_max_size.clone(),
                n_elms,
            ));
        }
    }
    let n_elms_usize = n_elms
        .to_usize()
        .ok_or_else(|| HintError::ValueOutOfRange(n_elms.clone()))?;
    for i in 0..n_elms_usize {
        let value = vm.get_integer(array_start + elm_size * i)?;
        if value >= &key {
            return insert_value_from_var_name(
                "index",
                Felt252::from(i),
                vm,
                ids_data,
                ap_tracking,
            );
        }
    }
    insert_value_from_var_name("index", n_elms, vm, ids_data, ap_tracking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;

    fn init_vm() -> (VirtualMachine, HashMap<String, HintReference>) {
        let mut vm = vm!();
        // Two elements of size 2: (1, 2), (3, 4); key to find in [fp - 1].
        vm.segments = segments![
            ((1, 0), (2, 0)),
            ((1, 1), 2),
            ((1, 2), 2),
            ((1, 4), 3),
            ((2, 0), 1),
            ((2, 1), 2),
            ((2, 2), 3),
            ((2, 3), 4)
        ];
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 5),
            relocatable!(1, 5),
        );
        let ids_data = non_continuous_ids_data![
            ("array_ptr", -5),
            ("elm_size", -4),
            ("n_elms", -3),
            ("index", -2),
            ("key", -1)
        ];
        (vm, ids_data)
    }

    #[test]
    fn find_element_locates_the_key() {
        let (mut vm, ids_data) = init_vm();
        let mut exec_scopes = ExecutionScopes::new();
        find_element(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 3)),
            Some(&mayberelocatable!(1))
        );
    }

    #[test]
    fn find_element_missing_key_fails() {
        let (mut vm, ids_data) = init_vm();
        vm.segments.memory.data[1][4] = Some(mayberelocatable!(9));
        let mut exec_scopes = ExecutionScopes::new();
        assert_matches!(
            find_element(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default()),
            Err(HintError::NoValueForKeyFindElement(_))
        );
    }

    #[test]
    fn find_element_respects_max_size() {
        let (mut vm, ids_data) = init_vm();
        let mut exec_scopes = ExecutionScopes::new();
        exec_scopes.insert_value("find_element_max_size", Felt252::from(1_u32));
        assert_matches!(
            find_element(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default()),
            Err(HintError::FindElemMaxSize(_, _))
        );
    }

    #[test]
    fn find_element_uses_index_from_scope() {
        let (mut vm, ids_data) = init_vm();
        let mut exec_scopes = ExecutionScopes::new();
        exec_scopes.insert_value("find_element_index", Felt252::from(1_u32));
        find_element(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 3)),
            Some(&mayberelocatable!(1))
        );
        // The index is consumed.
        assert!(exec_scopes.get::<Felt252>("find_element_index").is_err());
    }

    #[test]
    fn find_element_wrong_index_from_scope_fails() {
        let (mut vm, ids_data) = init_vm();
        let mut exec_scopes = ExecutionScopes::new();
        exec_scopes.insert_value("find_element_index", Felt252::from(0_u32));
        assert_matches!(
            find_element(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default()),
            Err(HintError::InvalidIndex(_, _, _))
        );
    }

    #[test]
    fn search_sorted_lower_finds_first_not_below() {
        let (mut vm, ids_data) = init_vm();
        let mut exec_scopes = ExecutionScopes::new();
        search_sorted_lower(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default())
            .unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 3)),
            Some(&mayberelocatable!(1))
        );
    }

    #[test]
    fn search_sorted_lower_returns_n_elms_when_all_below() {
        let (mut vm, ids_data) = init_vm();
        vm.segments.memory.data[1][4] = Some(mayberelocatable!(100));
        let mut exec_scopes = ExecutionScopes::new();
        search_sorted_lower(&mut vm, &mut exec_scopes, &ids_data, &ApTracking::default())
            .unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 3)),
            Some(&mayberelocatable!(2))
        );
    }
}
