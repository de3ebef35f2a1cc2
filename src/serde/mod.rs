pub mod deserialize_program;
pub mod deserialize_utils;
