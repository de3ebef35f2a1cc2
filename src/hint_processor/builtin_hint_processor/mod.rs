pub mod builtin_hint_processor_definition;
pub mod dict_hint_utils;
pub mod dict_manager;
pub mod find_element_hint;
pub mod hint_code;
pub mod hint_utils;
pub mod keccak_utils;
pub mod math_utils;
pub mod memcpy_hint_utils;
pub mod pow_utils;
pub mod secp;
pub mod set;
pub mod uint256_utils;
