use std::collections::HashMap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use crate::hint_processor::builtin_hint_processor::hint_utils::get_relocatable_from_var_name;
use crate::hint_processor::builtin_hint_processor::secp::bigint_utils::BigInt3;
use crate::hint_processor::builtin_hint_processor::secp::secp_utils::SECP_P;
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::serde::deserialize_program::ApTracking;
use crate::types::exec_scope::ExecutionScopes;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

//Implements the logic shared by the EC_NEGATE hints: reads ids.point.y as a
//BigInt3, packs it, and leaves (-y) % SECP_P in scope under "value".
fn ec_negate(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
    secp_p: BigInt,
) -> Result<(), HintError> {
    //EcPoint is (x: BigInt3, y: BigInt3); y starts three cells in.
    let point_y = get_relocatable_from_var_name("point", vm, ids_data, ap_tracking)? + 3_i32;
    let y_bigint3 = BigInt3::from_base_addr(point_y, "point.y", vm)?;
    let y = y_bigint3.pack86();
    let value = (-y).mod_floor(&secp_p);
    exec_scopes.insert_value("value", value);
    exec_scopes.insert_value("SECP_P", secp_p);
    Ok(())
}

//Implements hint:
// %{
//     from starkware.cairo.common.cairo_secp.secp_utils import SECP_P, pack
//
//     y = pack(ids.point.y, PRIME) % SECP_P
//     # The modulo operation in python always returns a nonnegative number.
//     value = (-y) % SECP_P
// %}
pub fn ec_negate_import_secp_p(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    ec_negate(vm, exec_scopes, ids_data, ap_tracking, SECP_P.clone())
}

//Same logic over the embedded curve prime 2^255 - 19.
pub fn ec_negate_embedded_secp_p(
    vm: &mut VirtualMachine,
    exec_scopes: &mut ExecutionScopes,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let secp_p = (BigInt::one() << 255_u32) - 19;
    ec_negate(vm, exec_scopes, ids_data, ap_tracking, secp_p)
}
