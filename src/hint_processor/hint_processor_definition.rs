use std::any::Any;
use std::collections::HashMap;

use felt::Felt252;

use crate::serde::deserialize_program::{ApTracking, Reference};
use crate::types::exec_scope::ExecutionScopes;
use crate::types::instruction::Register;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::errors::vm_errors::VirtualMachineError;
use crate::vm::vm_core::VirtualMachine;

pub trait HintProcessor {
    ///Executes the hint whose compiled data is given. The VM is borrowed for
    ///the duration of the call only.
    fn execute_hint(
        &self,
        vm: &mut VirtualMachine,
        exec_scopes: &mut ExecutionScopes,
        hint_data: &Box<dyn Any>,
        constants: &HashMap<String, Felt252>,
    ) -> Result<(), HintError>;

    ///Builds the hint's compiled representation: its code plus an ids
    ///snapshot resolving each flat name to its reference.
    fn compile_hint(
        &self,
        hint_code: &str,
        ap_tracking_data: &ApTracking,
        reference_ids: &HashMap<String, usize>,
        references: &[HintReference],
    ) -> Result<Box<dyn Any>, VirtualMachineError>;
}

#[derive(Debug, PartialEq, Clone)]
pub struct HintReference {
    pub register: Option<Register>,
    pub offset1: i32,
    pub offset2: i32,
    pub dereference: bool,
    pub inner_dereference: bool,
    pub immediate: Option<Felt252>,
    pub ap_tracking_data: Option<ApTracking>,
}

impl HintReference {
    pub fn new_simple(offset1: i32) -> Self {
        HintReference {
            register: Some(Register::FP),
            offset1,
            offset2: 0,
            dereference: true,
            inner_dereference: false,
            immediate: None,
            ap_tracking_data: None,
        }
    }

    pub fn new(offset1: i32, offset2: i32, inner_dereference: bool, dereference: bool) -> Self {
        HintReference {
            register: Some(Register::FP),
            offset1,
            offset2,
            dereference,
            inner_dereference,
            immediate: None,
            ap_tracking_data: None,
        }
    }
}

impl From<&Reference> for HintReference {
    fn from(reference: &Reference) -> Self {
        HintReference {
            register: reference.value_address.register.clone(),
            offset1: reference.value_address.offset1,
            offset2: reference.value_address.offset2,
            dereference: reference.value_address.dereference,
            inner_dereference: reference.value_address.inner_dereference,
            immediate: reference.value_address.immediate.clone(),
            ap_tracking_data: Some(reference.ap_tracking_data.clone()),
        }
    }
}

/// Maps each flat identifier name of a hint to its reference. Dotted names
/// keep only the last path segment, the one hints use.
pub fn get_ids_data(
    reference_ids: &HashMap<String, usize>,
    references: &[HintReference],
) -> Result<HashMap<String, HintReference>, VirtualMachineError> {
    let mut ids_data = HashMap::<String, HintReference>::new();
    for (path, ref_id) in reference_ids.iter() {
        let name = path.rsplit('.').next().unwrap_or(path);
        ids_data.insert(
            name.to_string(),
            references
                .get(*ref_id)
                .ok_or(VirtualMachineError::FailedToGetReference(*ref_id))?
                .clone(),
        );
    }
    Ok(ids_data)
}
