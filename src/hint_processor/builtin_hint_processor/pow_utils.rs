use std::collections::HashMap;

use felt::Felt252;

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_relocatable_from_var_name, insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

//Implements hint: ids.locs.bit = (ids.prev_locs.exp % PRIME) & 1
pub fn pow(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    // LoopLocals.exp is the fifth member of the struct the reference points
    // at.
    let prev_locs_exp_addr =
        get_relocatable_from_var_name("prev_locs", vm, ids_data, ap_tracking)? + 4_i32;
    let prev_locs_exp = vm.get_integer(prev_locs_exp_addr).map_err(|_| {
        HintError::IdentifierHasNoMember("prev_locs".to_string(), "exp".to_string())
    })?;
    let locs_bit = Felt252::from(prev_locs_exp.is_odd());
    insert_value_from_var_name("locs", locs_bit, vm, ids_data, ap_tracking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;

    #[test]
    fn pow_writes_lsb_of_exp() {
        let mut vm = vm!();
        // prev_locs occupies [fp - 6, fp - 1), locs starts at [fp - 1].
        vm.segments = segments![((1, 4), 3)];
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 6),
            relocatable!(1, 6),
        );
        let ids_data = non_continuous_ids_data![("prev_locs", -6), ("locs", -1)];
        pow(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 5)),
            Some(&mayberelocatable!(1))
        );
    }

    #[test]
    fn pow_without_exp_member_fails() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 3)];
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, 6),
            relocatable!(1, 6),
        );
        let ids_data = non_continuous_ids_data![("prev_locs", -6), ("locs", -1)];
        assert_matches!(
            pow(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::IdentifierHasNoMember(_, _))
        );
    }
}
