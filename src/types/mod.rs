pub mod errors;
pub mod exec_scope;
pub mod instruction;
pub mod program;
pub mod relocatable;
