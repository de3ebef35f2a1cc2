use std::cmp;
use std::collections::HashMap;

use felt::Felt252;
use sha3::{Digest, Keccak256};

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_integer_from_var_name, get_ptr_from_var_name, get_relocatable_from_var_name,
    insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::exec_scope::ExecutionScopes;
use crate::types::relocatable::Relocatable;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

//Implements hint:
// %{
//     from eth_hash.auto import keccak
//
//     data, length = ids.data, ids.length
//
//     if '__keccak_max_size' in globals():
//         assert length <= __keccak_max_size, \
//             f'unsafe_keccak() can only be used with length<={__keccak_max_size}. ' \
//             f'Got: length={length}.'
//
//     keccak_input = bytearray()
//     for word_i, byte_i in enumerate(range(0, length, 16)):
//         word = memory[data + word_i]
//         n_bytes = min(16, length - byte_i)
//         assert 0 <= word < 2 ** (8 * n_bytes)
//         keccak_input += word.to_bytes(n_bytes, 'big')
//
//     hashed = keccak(keccak_input)
//     ids.high = int.from_bytes(hashed[:16], 'big')
//     ids.low = int.from_bytes(hashed[16:32], 'big')
// %}
pub fn unsafe_keccak(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let length = get_integer_from_var_name("length", vm, ids_data, ap_tracking)?;

    if let Ok(keccak_max_size) = exec_scopes.get::<Felt252>("__keccak_max_size") {
        if length > keccak_max_size {
            return Err(HintError::KeccakSizeExceeded(keccak_max_size, length));
        }
    }

    // data is an array, represented by a pointer to its first word.
    let data = get_ptr_from_var_name("data", vm, ids_data, ap_tracking)?;
    let u64_length = length
        .to_u64()
        .ok_or_else(|| HintError::InvalidKeccakInputLength(length.clone()))?;

    let mut keccak_input = Vec::new();
    for (word_i, byte_i) in (0..u64_length).step_by(16).enumerate() {
        let word = vm.get_integer(data + word_i)?;
        let n_bytes = cmp::min(16, u64_length - byte_i) as usize;
        if word.bits() > 8 * n_bytes as u64 {
            return Err(HintError::InvalidWordSize(word.clone()));
        }
        let bytes = word.to_be_bytes();
        keccak_input.extend_from_slice(&bytes[32 - n_bytes..]);
    }

    let mut hasher = Keccak256::new();
    hasher.update(keccak_input);
    let hashed = hasher.finalize();

    let high = Felt252::from_bytes_be(&hashed[..16]);
    let low = Felt252::from_bytes_be(&hashed[16..32]);
    insert_value_from_var_name("high", high, vm, ids_data, ap_tracking)?;
    insert_value_from_var_name("low", low, vm, ids_data, ap_tracking)
}

//Implements hint:
// %{
//     from eth_hash.auto import keccak
//     keccak_input = bytearray()
//     n_elms = ids.keccak_state.end_ptr - ids.keccak_state.start_ptr
//     for word in memory.get_range(ids.keccak_state.start_ptr, n_elms):
//         keccak_input += word.to_bytes(16, 'big')
//     hashed = keccak(keccak_input)
//     ids.high = int.from_bytes(hashed[:16], 'big')
//     ids.low = int.from_bytes(hashed[16:32], 'big')
// %}
pub fn unsafe_keccak_finalize(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    //KeccakState is (start_ptr: felt*, end_ptr: felt*); the struct pointer
    //doubles as the address of its first field.
    let keccak_state_ptr =
        get_relocatable_from_var_name("keccak_state", vm, ids_data, ap_tracking)?;
    let start_ptr = vm.get_relocatable(keccak_state_ptr)?;
    let end_ptr = vm.get_relocatable(Relocatable {
        segment_index: keccak_state_ptr.segment_index,
        offset: keccak_state_ptr.offset + 1,
    })?;
    let n_elems = end_ptr.sub(&start_ptr)?;

    let mut keccak_input = Vec::new();
    for word in vm.get_integer_range(start_ptr, n_elems)? {
        if word.bits() > 128 {
            return Err(HintError::InvalidWordSize(word));
        }
        // Each word is packed as a 16-byte big-endian chunk.
        keccak_input.extend_from_slice(&word.to_be_bytes()[16..]);
    }

    let mut hasher = Keccak256::new();
    hasher.update(keccak_input);
    let hashed = hasher.finalize();

    let high = Felt252::from_bytes_be(&hashed[..16]);
    let low = Felt252::from_bytes_be(&hashed[16..32]);
    insert_value_from_var_name("high", high, vm, ids_data, ap_tracking)?;
    insert_value_from_var_name("low", low, vm, ids_data, ap_tracking)
}
