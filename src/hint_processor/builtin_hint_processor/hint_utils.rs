use std::collections::HashMap;

use felt::Felt252;

use crate::hint_processor::hint_processor_definition::HintReference;
use crate::hint_processor::hint_processor_utils::{
    compute_addr_from_reference, get_maybe_relocatable_from_reference,
};
use crate::serde::deserialize_program::ApTracking;
use crate::types::relocatable::{MaybeRelocatable, Relocatable};
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

pub fn get_reference_from_var_name<'a>(
    var_name: &str,
    ids_data: &'a HashMap<String, HintReference>,
) -> Result<&'a HintReference, HintError> {
    ids_data
        .get(var_name)
        .ok_or_else(|| HintError::MissingIdentifier(var_name.to_string()))
}

///Address of the ids variable (before any dereference).
pub fn get_relocatable_from_var_name(
    var_name: &str,
    vm: &VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<Relocatable, HintError> {
    let reference = get_reference_from_var_name(var_name, ids_data)?;
    compute_addr_from_reference(reference, vm, ap_tracking)
        .ok_or_else(|| HintError::MissingIdentifier(var_name.to_string()))
}

///Value of the ids variable, whichever variant it holds.
pub fn get_maybe_relocatable_from_var_name(
    var_name: &str,
    vm: &VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<MaybeRelocatable, HintError> {
    let reference = get_reference_from_var_name(var_name, ids_data)?;
    get_maybe_relocatable_from_reference(vm, reference, ap_tracking)
        .ok_or_else(|| HintError::MissingIdentifier(var_name.to_string()))
}

pub fn get_integer_from_var_name(
    var_name: &str,
    vm: &VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<Felt252, HintError> {
    get_maybe_relocatable_from_var_name(var_name, vm, ids_data, ap_tracking)?
        .get_int()
        .ok_or_else(|| HintError::IdentifierNotFelt(var_name.to_string()))
}

pub fn get_ptr_from_var_name(
    var_name: &str,
    vm: &VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<Relocatable, HintError> {
    get_maybe_relocatable_from_var_name(var_name, vm, ids_data, ap_tracking)?
        .get_relocatable()
        .ok_or_else(|| HintError::IdentifierNotRelocatable(var_name.to_string()))
}

pub fn insert_value_from_var_name(
    var_name: &str,
    value: impl Into<MaybeRelocatable>,
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let var_address = get_relocatable_from_var_name(var_name, vm, ids_data, ap_tracking)?;
    vm.insert_value(var_address, value).map_err(HintError::Memory)
}

pub fn insert_value_into_ap(
    vm: &mut VirtualMachine,
    value: impl Into<MaybeRelocatable>,
) -> Result<(), HintError> {
    vm.insert_value(vm.get_ap(), value).map_err(HintError::Memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;

    #[test]
    fn get_integer_from_var_name_reads_the_cell() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 18)];
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 1),
            relocatable!(1, 1),
        );
        let ids_data = ids_data!["value"];
        assert_eq!(
            get_integer_from_var_name("value", &vm, &ids_data, &ApTracking::default()),
            Ok(Felt252::from(18_u32))
        );
    }

    #[test]
    fn missing_identifier_is_reported_by_name() {
        let vm = vm!();
        let ids_data = ids_data!["value"];
        assert_matches!(
            get_integer_from_var_name("other", &vm, &ids_data, &ApTracking::default()),
            Err(HintError::MissingIdentifier(name)) if name == "other"
        );
    }

    #[test]
    fn type_mismatch_is_reported_by_name() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), (2, 0))];
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 1),
            relocatable!(1, 1),
        );
        let ids_data = ids_data!["ptr"];
        assert_matches!(
            get_integer_from_var_name("ptr", &vm, &ids_data, &ApTracking::default()),
            Err(HintError::IdentifierNotFelt(name)) if name == "ptr"
        );
        assert_eq!(
            get_ptr_from_var_name("ptr", &vm, &ids_data, &ApTracking::default()),
            Ok(relocatable!(2, 0))
        );
    }

    #[test]
    fn insert_value_from_var_name_writes_the_cell() {
        let mut vm = vm!();
        vm.segments = segments![((1, 1), 0)];
        vm.segments.memory.data[1].clear();
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 1),
            relocatable!(1, 1),
        );
        let ids_data = ids_data!["result"];
        insert_value_from_var_name(
            "result",
            Felt252::from(7_u32),
            &mut vm,
            &ids_data,
            &ApTracking::default(),
        )
        .unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 0)),
            Some(&mayberelocatable!(7))
        );
    }
}
