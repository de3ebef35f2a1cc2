pub mod bigint_utils;
pub mod ec_utils;
pub mod secp_utils;
