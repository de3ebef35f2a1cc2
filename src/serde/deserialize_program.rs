use std::collections::HashMap;
use std::fmt;
use std::io::Read;

use felt::{Felt252, PRIME_STR};
use num_bigint::{BigInt, BigUint};
use serde::{de, de::SeqAccess, Deserialize, Deserializer};
use serde_json::Number;

use crate::serde::deserialize_utils;
use crate::types::errors::program_errors::ProgramError;
use crate::types::instruction::Register;
use crate::types::program::Program;
use crate::types::relocatable::MaybeRelocatable;

#[derive(Deserialize, Debug)]
pub struct ProgramJson {
    pub prime: String,
    pub builtins: Vec<String>,
    #[serde(deserialize_with = "deserialize_array_of_felt_hex")]
    pub data: Vec<MaybeRelocatable>,
    pub identifiers: HashMap<String, Identifier>,
    pub hints: HashMap<usize, Vec<HintParams>>,
    pub reference_manager: ReferenceManager,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HintParams {
    pub code: String,
    pub accessible_scopes: Vec<String>,
    pub flow_tracking_data: FlowTrackingData,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FlowTrackingData {
    pub ap_tracking: ApTracking,
    pub reference_ids: HashMap<String, usize>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApTracking {
    pub group: usize,
    pub offset: usize,
}

impl ApTracking {
    pub fn new() -> ApTracking {
        ApTracking {
            group: 0,
            offset: 0,
        }
    }
}

impl Default for ApTracking {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Identifier {
    pub pc: Option<usize>,
    #[serde(rename(deserialize = "type"))]
    pub type_: Option<String>,
    #[serde(default)]
    #[serde(deserialize_with = "felt_from_number")]
    pub value: Option<Felt252>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct ReferenceManager {
    pub references: Vec<Reference>,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Reference {
    pub ap_tracking_data: ApTracking,
    pub pc: Option<usize>,
    #[serde(deserialize_with = "deserialize_value_address")]
    #[serde(rename(deserialize = "value"))]
    pub value_address: ValueAddress,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct ValueAddress {
    pub register: Option<Register>,
    pub offset1: i32,
    pub offset2: i32,
    pub immediate: Option<Felt252>,
    pub dereference: bool,
    pub inner_dereference: bool,
    pub value_type: String,
}

impl ValueAddress {
    // Parsing is focused on the reference formats hints actually use. When a
    // reference is not parsable the default marks it, and using it from a
    // hint surfaces as a missing identifier.
    pub fn no_hint_reference_default() -> ValueAddress {
        ValueAddress {
            register: None,
            offset1: 99,
            offset2: 99,
            immediate: Some(Felt252::from(99_u32)),
            dereference: false,
            inner_dereference: false,
            value_type: String::from("felt"),
        }
    }
}

fn felt_from_number<'de, D>(deserializer: D) -> Result<Option<Felt252>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = Number::deserialize(deserializer)?;
    Ok(BigInt::parse_bytes(n.to_string().as_bytes(), 10).map(Felt252::from))
}

struct MaybeRelocatableVisitor;

impl<'de> de::Visitor<'de> for MaybeRelocatableVisitor {
    type Value = Vec<MaybeRelocatable>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("Could not deserialize array of hexadecimal")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut data: Vec<MaybeRelocatable> = vec![];
        while let Some(value) = seq.next_element::<String>()? {
            let no_prefix_hex = value
                .strip_prefix("0x")
                .ok_or_else(|| de::Error::custom("hex prefix error"))?;
            let no_prefix_hex = deserialize_utils::maybe_add_padding(no_prefix_hex.to_string());
            let decoded = hex::decode(&no_prefix_hex).map_err(de::Error::custom)?;
            data.push(MaybeRelocatable::Int(Felt252::from(
                BigUint::from_bytes_be(&decoded),
            )));
        }
        Ok(data)
    }
}

struct ValueAddressVisitor;

impl<'de> de::Visitor<'de> for ValueAddressVisitor {
    type Value = ValueAddress;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string representing the address in memory of a variable")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if let Ok((_, value_address)) = deserialize_utils::parse_value(value) {
            return Ok(value_address);
        }
        Ok(ValueAddress::no_hint_reference_default())
    }
}

pub fn deserialize_array_of_felt_hex<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Vec<MaybeRelocatable>, D::Error> {
    d.deserialize_seq(MaybeRelocatableVisitor)
}

pub fn deserialize_value_address<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<ValueAddress, D::Error> {
    d.deserialize_str(ValueAddressVisitor)
}

pub fn deserialize_program_json(reader: impl Read) -> Result<ProgramJson, ProgramError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn deserialize_program(
    reader: impl Read,
    entrypoint: &str,
) -> Result<Program, ProgramError> {
    let program_json = deserialize_program_json(reader)?;
    if program_json.prime != PRIME_STR {
        return Err(ProgramError::PrimeDiffersFromCairoPrime);
    }

    let entrypoint_identifier = format!("__main__.{}", entrypoint);
    let main = match program_json.identifiers.get(&entrypoint_identifier) {
        Some(identifier) => Some(
            identifier
                .pc
                .ok_or(ProgramError::IdentifierHasNoPc(entrypoint_identifier))?,
        ),
        None => return Err(ProgramError::EntrypointNotFound(entrypoint.to_string())),
    };

    let constants = program_json
        .identifiers
        .iter()
        .filter(|(_, identifier)| identifier.type_.as_deref() == Some("const"))
        .filter_map(|(key, identifier)| {
            identifier
                .value
                .clone()
                .map(|value| (key.clone(), value))
        })
        .collect();

    Ok(Program {
        builtins: program_json.builtins,
        data: program_json.data,
        constants,
        main,
        hints: program_json.hints,
        reference_manager: program_json.reference_manager,
        identifiers: program_json.identifiers,
    })
}
