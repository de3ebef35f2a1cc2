use felt::Felt252;
use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_traits::One;

lazy_static! {
    //Secp256k1 prime, 2^256 - 2^32 - 977.
    pub static ref SECP_P: BigInt =
        (BigInt::one() << 256_u32) - (BigInt::one() << 32_u32) - 977;
    //Base of the BigInt3 limb representation.
    pub static ref BASE_86: BigInt = BigInt::one() << 86_u32;
}

/// Packs three 86-bit limbs into a BigInt. Each limb is lifted into the
/// signed range first, the way the Cairo secp library interprets them.
pub fn pack(limbs: [&Felt252; 3]) -> BigInt {
    limbs
        .iter()
        .enumerate()
        .map(|(i, limb)| limb.to_signed_felt() << (i * 86))
        .sum()
}
