use felt::Felt252;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::digit1,
    combinator::{map_res, opt, recognize},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use num_integer::Integer;
use parse_hyperlinks::take_until_unbalanced;

use crate::serde::deserialize_program::ValueAddress;
use crate::types::instruction::Register;

// Checks if the hex string has an odd length; if so, prepends '0'.
pub fn maybe_add_padding(mut hex: String) -> String {
    if hex.len().is_odd() {
        hex.insert(0, '0');
    }
    hex
}

fn outer_brackets(input: &str) -> IResult<&str, bool> {
    opt(delimited(
        tag("["),
        take_until_unbalanced('[', ']'),
        tag("]"),
    ))(input)
    .map(|(rem_input, consumed)| match consumed {
        Some(consumed) => (consumed, true),
        None => (rem_input, false),
    })
}

fn take_cast(input: &str) -> IResult<&str, &str> {
    tuple((
        tag("cast"),
        delimited(tag("("), take_until_unbalanced('(', ')'), tag(")")),
    ))(input)
    .map(|(rem_input, (_, inside))| (inside, rem_input))
}

// Splits "fp + (-4), felt*" into the address expression and the cast type.
fn cast_args(input: &str) -> IResult<&str, (&str, &str)> {
    let (expression, _) = take_cast(input)?;
    let (type_str, expr) = take_until(",")(expression)?;
    let type_str = type_str.trim_start_matches(", ");
    Ok(("", (expr, type_str)))
}

fn register(input: &str) -> IResult<&str, Register> {
    alt((tag("ap"), tag("fp")))(input).map(|(rem_input, res)| {
        let register = match res {
            "ap" => Register::AP,
            _ => Register::FP,
        };
        (rem_input, register)
    })
}

// " + 2" or " + (-2)".
fn offset(input: &str) -> IResult<&str, i32> {
    map_res(
        preceded(
            tag(" + "),
            alt((
                delimited(tag("("), recognize(pair(opt(tag("-")), digit1)), tag(")")),
                recognize(digit1),
            )),
        ),
        str::parse::<i32>,
    )(input)
}

fn register_and_offset(input: &str) -> IResult<&str, (Register, i32)> {
    let (rem_input, reg) = register(input)?;
    let (rem_input, off) = opt(offset)(rem_input)?;
    Ok((rem_input, (reg, off.unwrap_or(0))))
}

fn inner_dereference(input: &str) -> IResult<&str, (bool, Register, i32)> {
    delimited(tag("["), register_and_offset, tag("]"))(input)
        .map(|(rem_input, (reg, off))| (rem_input, (true, reg, off)))
}

fn no_inner_dereference(input: &str) -> IResult<&str, (bool, Register, i32)> {
    register_and_offset(input).map(|(rem_input, (reg, off))| (rem_input, (false, reg, off)))
}

fn immediate(input: &str) -> IResult<&str, Felt252> {
    map_res(recognize(pair(opt(tag("-")), digit1)), |value: &str| {
        num_bigint::BigInt::parse_bytes(value.as_bytes(), 10)
            .map(Felt252::from)
            .ok_or(())
    })(input)
}

/// Parses a reference value expression such as "[cast(fp + (-4), felt*)]"
/// into its address description.
pub fn parse_value(input: &str) -> IResult<&str, ValueAddress> {
    let (rem_input, dereference) = outer_brackets(input)?;
    let (_, (expr, value_type)) = cast_args(rem_input)?;

    if let Ok((rest, imm)) = immediate(expr) {
        if rest.is_empty() {
            return Ok((
                "",
                ValueAddress {
                    register: None,
                    offset1: 0,
                    offset2: 0,
                    immediate: Some(imm),
                    dereference,
                    inner_dereference: false,
                    value_type: value_type.to_string(),
                },
            ));
        }
    }

    let (expr, (inner_deref, reg, offset1)) =
        alt((inner_dereference, no_inner_dereference))(expr)?;
    let (_, offset2) = opt(offset)(expr)?;

    Ok((
        "",
        ValueAddress {
            register: Some(reg),
            offset1,
            offset2: offset2.unwrap_or(0),
            immediate: None,
            dereference,
            inner_dereference: inner_deref,
            value_type: value_type.to_string(),
        },
    ))
}
