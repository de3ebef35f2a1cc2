use std::any::Any;
use std::collections::HashMap;

use felt::Felt252;

use crate::hint_processor::builtin_hint_processor::dict_hint_utils::{
    default_dict_new, dict_new, dict_read, dict_update, dict_write,
};
use crate::hint_processor::builtin_hint_processor::find_element_hint::{
    find_element, search_sorted_lower,
};
use crate::hint_processor::builtin_hint_processor::hint_code;
use crate::hint_processor::builtin_hint_processor::keccak_utils::{
    unsafe_keccak, unsafe_keccak_finalize,
};
use crate::hint_processor::builtin_hint_processor::math_utils::{
    assert_nn, assert_not_equal, assert_not_zero, is_positive, is_quad_residue, sqrt,
};
use crate::hint_processor::builtin_hint_processor::memcpy_hint_utils::{
    add_segment, enter_scope, exit_scope, memcpy_enter_scope,
};
use crate::hint_processor::builtin_hint_processor::pow_utils::pow;
use crate::hint_processor::builtin_hint_processor::secp::ec_utils::{
    ec_negate_embedded_secp_p, ec_negate_import_secp_p,
};
use crate::hint_processor::builtin_hint_processor::set::set_add;
use crate::hint_processor::builtin_hint_processor::uint256_utils::uint256_add;
use crate::hint_processor::hint_processor_definition::{
    get_ids_data, HintProcessor, HintReference,
};
use crate::serde::deserialize_program::ApTracking;
use crate::types::exec_scope::ExecutionScopes;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::errors::vm_errors::VirtualMachineError;
use crate::vm::vm_core::VirtualMachine;

pub struct HintProcessorData {
    pub code: String,
    pub ap_tracking: ApTracking,
    pub ids_data: HashMap<String, HintReference>,
}

impl HintProcessorData {
    pub fn new_default(code: String, ids_data: HashMap<String, HintReference>) -> Self {
        HintProcessorData {
            code,
            ap_tracking: ApTracking::default(),
            ids_data,
        }
    }
}

#[allow(clippy::type_complexity)]
pub struct HintFunc(
    pub  Box<
        dyn Fn(
                &mut VirtualMachine,
                &mut ExecutionScopes,
                &HashMap<String, HintReference>,
                &ApTracking,
                &HashMap<String, Felt252>,
            ) -> Result<(), HintError>
            + Sync,
    >,
);

///Dispatches each hint to its implementation by the exact text of the
///hint's source code.
pub struct BuiltinHintProcessor {
    pub extra_hints: HashMap<String, HintFunc>,
}

impl BuiltinHintProcessor {
    pub fn new_empty() -> Self {
        BuiltinHintProcessor {
            extra_hints: HashMap::new(),
        }
    }

    pub fn new(extra_hints: HashMap<String, HintFunc>) -> Self {
        BuiltinHintProcessor { extra_hints }
    }

    pub fn add_hint(&mut self, hint_code: String, hint_func: HintFunc) {
        self.extra_hints.insert(hint_code, hint_func);
    }
}

impl HintProcessor for BuiltinHintProcessor {
    fn execute_hint(
        &self,
        vm: &mut VirtualMachine,
        exec_scopes: &mut ExecutionScopes,
        hint_data: &Box<dyn Any>,
        constants: &HashMap<String, Felt252>,
    ) -> Result<(), HintError> {
        let hint_data = hint_data
            .downcast_ref::<HintProcessorData>()
            .ok_or(HintError::WrongHintData)?;

        if let Some(hint_func) = self.extra_hints.get(&hint_data.code) {
            return hint_func.0(
                vm,
                exec_scopes,
                &hint_data.ids_data,
                &hint_data.ap_tracking,
                constants,
            );
        }

        match &*hint_data.code {
            hint_code::ADD_SEGMENT => add_segment(vm),
            hint_code::VM_ENTER_SCOPE => enter_scope(exec_scopes),
            hint_code::VM_EXIT_SCOPE => exit_scope(exec_scopes),
            hint_code::MEMCPY_ENTER_SCOPE => {
                memcpy_enter_scope(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::ASSERT_NN => assert_nn(vm, &hint_data.ids_data, &hint_data.ap_tracking),
            hint_code::IS_POSITIVE => {
                is_positive(vm, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::ASSERT_NOT_ZERO => {
                assert_not_zero(vm, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::ASSERT_NOT_EQUAL => {
                assert_not_equal(vm, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::SQRT => sqrt(vm, &hint_data.ids_data, &hint_data.ap_tracking),
            hint_code::IS_QUAD_RESIDUE => {
                is_quad_residue(vm, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::POW => pow(vm, &hint_data.ids_data, &hint_data.ap_tracking),
            hint_code::UINT256_ADD => {
                uint256_add(vm, &hint_data.ids_data, &hint_data.ap_tracking, false)
            }
            hint_code::UINT256_ADD_LOW => {
                uint256_add(vm, &hint_data.ids_data, &hint_data.ap_tracking, true)
            }
            hint_code::EC_NEGATE => ec_negate_import_secp_p(
                vm,
                exec_scopes,
                &hint_data.ids_data,
                &hint_data.ap_tracking,
            ),
            hint_code::EC_NEGATE_EMBEDDED_SECP => ec_negate_embedded_secp_p(
                vm,
                exec_scopes,
                &hint_data.ids_data,
                &hint_data.ap_tracking,
            ),
            hint_code::SET_ADD => set_add(vm, &hint_data.ids_data, &hint_data.ap_tracking),
            hint_code::FIND_ELEMENT => {
                find_element(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::SEARCH_SORTED_LOWER => search_sorted_lower(
                vm,
                exec_scopes,
                &hint_data.ids_data,
                &hint_data.ap_tracking,
            ),
            hint_code::DICT_NEW => dict_new(vm, exec_scopes),
            hint_code::DEFAULT_DICT_NEW => default_dict_new(
                vm,
                exec_scopes,
                &hint_data.ids_data,
                &hint_data.ap_tracking,
            ),
            hint_code::DICT_READ => {
                dict_read(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::DICT_WRITE => {
                dict_write(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::DICT_UPDATE => {
                dict_update(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::UNSAFE_KECCAK => {
                unsafe_keccak(vm, exec_scopes, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            hint_code::UNSAFE_KECCAK_FINALIZE => {
                unsafe_keccak_finalize(vm, &hint_data.ids_data, &hint_data.ap_tracking)
            }
            code => Err(HintError::UnknownHint(code.to_string())),
        }
    }

    fn compile_hint(
        &self,
        hint_code: &str,
        ap_tracking_data: &ApTracking,
        reference_ids: &HashMap<String, usize>,
        references: &[HintReference],
    ) -> Result<Box<dyn Any>, VirtualMachineError> {
        Ok(Box::new(HintProcessorData {
            code: hint_code.to_string(),
            ap_tracking: ap_tracking_data.clone(),
            ids_data: get_ids_data(reference_ids, references)?,
        }))
    }
}
