use std::collections::HashMap;

use felt::{Felt252, CAIRO_PRIME, PRIME_STR};
use lazy_static::lazy_static;
use num_bigint::Sign;
use num_traits::{One, Zero};

use crate::hint_processor::builtin_hint_processor::hint_utils::{
    get_integer_from_var_name, get_maybe_relocatable_from_var_name, insert_value_from_var_name,
};
use crate::hint_processor::hint_processor_definition::HintReference;
use crate::math_utils::isqrt;
use crate::serde::deserialize_program::ApTracking;
use crate::types::relocatable::MaybeRelocatable;
use crate::vm::errors::hint_errors::HintError;
use crate::vm::vm_core::VirtualMachine;

lazy_static! {
    // (PRIME - 1) / 2, the Euler criterion exponent.
    static ref QUAD_RESIDUE_EXP: Felt252 = Felt252::from(&*CAIRO_PRIME >> 1_u32);
    static ref TWO_POW_250: Felt252 = Felt252::from(2_u32).pow(250);
}

//Implements hint:
// %{
//     from starkware.cairo.common.math_utils import assert_integer
//     assert_integer(ids.a)
//     assert 0 <= ids.a % PRIME < range_check_builtin.bound, f'a = {ids.a} is out of range.'
// %}
pub fn assert_nn(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let a = get_integer_from_var_name("a", vm, ids_data, ap_tracking)?;
    let bound = vm.get_range_check_builtin()?.bound();
    // As the prime is positive, a % PRIME is never negative.
    if a >= bound {
        return Err(HintError::AssertNNValueOutOfRange(a));
    }
    Ok(())
}

//Implements hint:
// %{
//     from starkware.cairo.common.math_utils import is_positive
//     ids.is_positive = 1 if is_positive(
//         value=ids.value, prime=PRIME, rc_bound=range_check_builtin.bound) else 0
// %}
pub fn is_positive(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let value = get_integer_from_var_name("value", vm, ids_data, ap_tracking)?;
    let value_as_int = value.to_signed_felt();
    let bound = vm.get_range_check_builtin()?.bound();
    let (sign, abs_value) = value_as_int.into_parts();
    if Felt252::from(abs_value) >= bound {
        return Err(HintError::ValueOutsideValidRange(value));
    }
    let result = Felt252::from(sign == Sign::Plus);
    insert_value_from_var_name("is_positive", result, vm, ids_data, ap_tracking)
}

//Implements hint:
// %{
//     from starkware.cairo.common.math_utils import assert_integer
//     assert_integer(ids.value)
//     assert ids.value % PRIME != 0, f'assert_not_zero failed: {ids.value} = 0.'
// %}
pub fn assert_not_zero(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let value = get_integer_from_var_name("value", vm, ids_data, ap_tracking)?;
    if value.is_zero() {
        return Err(HintError::AssertNotZero(value, PRIME_STR.to_string()));
    };
    Ok(())
}

//Implements hint: assert (ids.a - ids.b) % PRIME != 0
//Values of different tags, or addresses of different segments, are not
//comparable in the first place.
pub fn assert_not_equal(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let maybe_rel_a = get_maybe_relocatable_from_var_name("a", vm, ids_data, ap_tracking)?;
    let maybe_rel_b = get_maybe_relocatable_from_var_name("b", vm, ids_data, ap_tracking)?;
    match (&maybe_rel_a, &maybe_rel_b) {
        (MaybeRelocatable::Int(a), MaybeRelocatable::Int(b)) => {
            if a == b {
                return Err(HintError::AssertNotEqualFail(maybe_rel_a, maybe_rel_b));
            }
            Ok(())
        }
        (MaybeRelocatable::RelocatableValue(a), MaybeRelocatable::RelocatableValue(b))
            if a.segment_index == b.segment_index =>
        {
            if a.offset == b.offset {
                return Err(HintError::AssertNotEqualFail(maybe_rel_a, maybe_rel_b));
            }
            Ok(())
        }
        _ => Err(HintError::AssertionFailed(format!(
            "assert_not_equal failed: non-comparable values: {}, {}.",
            maybe_rel_a, maybe_rel_b
        ))),
    }
}

//Implements hint:
// %{
//     from starkware.python.math_utils import isqrt
//     value = ids.value % PRIME
//     assert value < 2 ** 250, f"value={value} is outside of the range [0, 2**250)."
//     assert 2 ** 250 < PRIME
//     ids.root = isqrt(value)
// %}
pub fn sqrt(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let mod_value = get_integer_from_var_name("value", vm, ids_data, ap_tracking)?;
    if mod_value >= *TWO_POW_250 {
        return Err(HintError::ValueOutside250BitRange(mod_value));
    }
    let root = Felt252::from(isqrt(&mod_value.to_biguint()));
    insert_value_from_var_name("root", root, vm, ids_data, ap_tracking)
}

//Implements hint:
// %{
//     from starkware.crypto.signature.signature import FIELD_PRIME
//     from starkware.python.math_utils import div_mod, is_quad_residue, sqrt
//
//     x = ids.x
//     if is_quad_residue(x, FIELD_PRIME):
//         ids.y = sqrt(x, FIELD_PRIME)
//     else:
//         ids.y = sqrt(div_mod(x, 3, FIELD_PRIME), FIELD_PRIME)
// %}
pub fn is_quad_residue(
    vm: &mut VirtualMachine,
    ids_data: &HashMap<String, HintReference>,
    ap_tracking: &ApTracking,
) -> Result<(), HintError> {
    let x = get_integer_from_var_name("x", vm, ids_data, ap_tracking)?;
    if x.is_zero() || x.is_one() {
        insert_value_from_var_name("y", x, vm, ids_data, ap_tracking)
    } else if x.pow_felt(&QUAD_RESIDUE_EXP).is_one() {
        insert_value_from_var_name("y", x.sqrt(), vm, ids_data, ap_tracking)
    } else {
        let value = x / Felt252::from(3_u32);
        insert_value_from_var_name("y", value.sqrt(), vm, ids_data, ap_tracking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::*;
    use crate::vm::runners::builtin_runner::RangeCheckBuiltinRunner;
    use crate::{mayberelocatable, relocatable};
    use assert_matches::assert_matches;
    use felt::felt_str;

    fn vm_with_range_check() -> VirtualMachine {
        let mut vm = vm!();
        vm.builtin_runners
            .push(RangeCheckBuiltinRunner::new(true).into());
        vm
    }

    fn set_fp(vm: &mut VirtualMachine, offset: usize) {
        vm.run_context = crate::vm::context::run_context::RunContext::new(
            relocatable!(0, 0),
            relocatable!(1, offset),
            relocatable!(1, offset),
        );
    }

    #[test]
    fn assert_nn_passes_for_small_value() {
        let mut vm = vm_with_range_check();
        vm.segments = segments![((1, 0), 17)];
        set_fp(&mut vm, 1);
        let ids_data = ids_data!["a"];
        assert_eq!(
            assert_nn(&mut vm, &ids_data, &ApTracking::default()),
            Ok(())
        );
    }

    #[test]
    fn assert_nn_fails_above_rc_bound() {
        let mut vm = vm_with_range_check();
        vm.segments = segments![((1, 1), 1)];
        vm.segments
            .memory
            .insert(
                relocatable!(1, 0),
                &MaybeRelocatable::Int(felt_str!("340282366920938463463374607431768211456")),
            )
            .unwrap();
        set_fp(&mut vm, 1);
        let ids_data = ids_data!["a"];
        assert_matches!(
            assert_nn(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::AssertNNValueOutOfRange(_))
        );
    }

    #[test]
    fn is_positive_writes_one_for_positive() {
        let mut vm = vm_with_range_check();
        vm.segments = segments![((1, 0), 17), ((1, 1), 99)];
        vm.segments.memory.data[1].pop();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["value", "is_positive"];
        is_positive(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 1)),
            Some(&mayberelocatable!(1))
        );
    }

    #[test]
    fn is_positive_writes_zero_for_negative() {
        let mut vm = vm_with_range_check();
        vm.segments = segments![((1, 1), 99)];
        vm.segments.memory.data[1].pop();
        vm.segments
            .memory
            .insert(
                relocatable!(1, 0),
                &MaybeRelocatable::Int(Felt252::zero() - Felt252::from(10_u32)),
            )
            .unwrap();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["value", "is_positive"];
        is_positive(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 1)),
            Some(&mayberelocatable!(0))
        );
    }

    #[test]
    fn assert_not_zero_fails_on_zero() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 0)];
        set_fp(&mut vm, 1);
        let ids_data = ids_data!["value"];
        assert_matches!(
            assert_not_zero(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::AssertNotZero(_, _))
        );
    }

    #[test]
    fn assert_not_equal_fails_on_equal_felts() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 7), ((1, 1), 7)];
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["a", "b"];
        assert_matches!(
            assert_not_equal(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::AssertNotEqualFail(_, _))
        );
    }

    #[test]
    fn assert_not_equal_passes_on_different_offsets() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), (2, 1)), ((1, 1), (2, 4))];
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["a", "b"];
        assert_eq!(
            assert_not_equal(&mut vm, &ids_data, &ApTracking::default()),
            Ok(())
        );
    }

    #[test]
    fn assert_not_equal_mixed_tags_are_non_comparable() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), (2, 1)), ((1, 1), 7)];
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["a", "b"];
        assert_matches!(
            assert_not_equal(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::AssertionFailed(_))
        );
    }

    #[test]
    fn sqrt_computes_integer_root() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 81), ((1, 1), 0)];
        vm.segments.memory.data[1].pop();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["value", "root"];
        sqrt(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 1)),
            Some(&mayberelocatable!(9))
        );
    }

    #[test]
    fn sqrt_rejects_values_over_250_bits() {
        let mut vm = vm!();
        vm.segments = segments![((1, 1), 0)];
        vm.segments.memory.data[1].pop();
        vm.segments
            .memory
            .insert(
                relocatable!(1, 0),
                &MaybeRelocatable::Int(Felt252::from(2_u32).pow(250)),
            )
            .unwrap();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["value", "root"];
        assert_matches!(
            sqrt(&mut vm, &ids_data, &ApTracking::default()),
            Err(HintError::ValueOutside250BitRange(_))
        );
    }

    #[test]
    fn is_quad_residue_of_square_is_its_root() {
        let mut vm = vm!();
        vm.segments = segments![((1, 0), 49), ((1, 1), 0)];
        vm.segments.memory.data[1].pop();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["x", "y"];
        is_quad_residue(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        assert_eq!(
            vm.segments.memory.get(&relocatable!(1, 1)),
            Some(&mayberelocatable!(7))
        );
    }

    #[test]
    fn is_quad_residue_of_non_residue_divides_by_three() {
        let mut vm = vm!();
        // 3 * g^2 for some g is a non-residue iff 3 is; either way the hint
        // must produce y with y^2 in {x, x/3}.
        vm.segments = segments![((1, 0), 5), ((1, 1), 0)];
        vm.segments.memory.data[1].pop();
        set_fp(&mut vm, 2);
        let ids_data = ids_data!["x", "y"];
        is_quad_residue(&mut vm, &ids_data, &ApTracking::default()).unwrap();
        let y = vm
            .segments
            .memory
            .get_integer(relocatable!(1, 1))
            .unwrap()
            .clone();
        let y_squared = &y * &y;
        let x = Felt252::from(5_u32);
        let x_thirds = &x / &Felt252::from(3_u32);
        assert!(y_squared == x || y_squared == x_thirds);
    }
}
