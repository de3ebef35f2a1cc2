use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use felt::Felt252;

use crate::serde::deserialize_program::{
    deserialize_program, HintParams, Identifier, ReferenceManager,
};
use crate::types::errors::program_errors::ProgramError;
use crate::types::relocatable::MaybeRelocatable;

/// The immutable description of a compiled Cairo program, as produced by the
/// deserializer.
#[derive(Clone, Debug)]
pub struct Program {
    pub builtins: Vec<String>,
    pub data: Vec<MaybeRelocatable>,
    pub constants: HashMap<String, Felt252>,
    pub main: Option<usize>,
    pub hints: HashMap<usize, Vec<HintParams>>,
    pub reference_manager: ReferenceManager,
    pub identifiers: HashMap<String, Identifier>,
}

impl Program {
    pub fn from_file(path: &Path, entrypoint: &str) -> Result<Program, ProgramError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        deserialize_program(reader, entrypoint)
    }

    pub fn from_reader(reader: impl Read, entrypoint: &str) -> Result<Program, ProgramError> {
        deserialize_program(reader, entrypoint)
    }

    /// A program with only bytecode and an entrypoint; handy as a base for
    /// programmatic construction.
    pub fn from_data(data: Vec<MaybeRelocatable>, main: Option<usize>) -> Program {
        Program {
            builtins: Vec::new(),
            data,
            constants: HashMap::new(),
            main,
            hints: HashMap::new(),
            reference_manager: ReferenceManager {
                references: Vec::new(),
            },
            identifiers: HashMap::new(),
        }
    }
}
