use std::collections::HashMap;

use felt::Felt252;
use num_bigint::BigInt;

use crate::hint_processor::builtin_hint_processor::hint_utils::get_relocatable_from_var_name;
use crate::hint_processor::builtin_hint_processor::secp::secp_utils::pack;
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::relocatable::Relocatable;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

/// The secp library's unreduced big integer: three 86-bit limbs d0..d2 laid
/// out contiguously in memory.
#[derive(Debug, PartialEq)]
pub struct BigInt3 {
    pub limbs: [Felt252; 3],
}

impl BigInt3 {
    pub fn from_base_addr(
        addr: Relocatable,
        name: &str,
        vm: &VirtualMachine,
    ) -> Result<BigInt3, HintError> {
        let mut limbs = Vec::with_capacity(3);
        for i in 0..3 {
            limbs.push(vm.get_integer(addr + i).cloned().map_err(|_| {
                HintError::IdentifierHasNoMember(name.to_string(), format!("d{}", i))
            })?)
        }
        // Cannot fail: exactly three limbs were read.
        Ok(BigInt3 {
            limbs: limbs.try_into().unwrap(),
        })
    }

    pub fn from_var_name(
        name: &str,
        vm: &VirtualMachine,
        ids_data: &HashMap<String, HintReference>,
        ap_tracking: &ApTracking,
    ) -> Result<BigInt3, HintError> {
        let base_addr = get_relocatable_from_var_name(name, vm, ids_data, ap_tracking)?;
        BigInt3::from_base_addr(base_addr, name, vm)
    }

    pub fn pack86(&self) -> BigInt {
        pack([&self.limbs[0], &self.limbs[1], &self.limbs[2]])
    }
}
