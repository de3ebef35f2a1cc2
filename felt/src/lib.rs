use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub},
};

use lambdaworks_math::{
    field::{
        element::FieldElement, fields::fft_friendly::stark_252_prime_field::Stark252PrimeField,
    },
    unsigned_integer::element::UnsignedInteger,
};
use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint, Sign, ToBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

pub const PRIME_STR: &str = "0x800000000000011000000000000000000000000000000000000000000000001";
pub const FIELD_HIGH: u128 = (1 << 123) + (17 << 64);
pub const FIELD_LOW: u128 = 1;

lazy_static! {
    pub static ref CAIRO_PRIME: BigUint =
        (Into::<BigUint>::into(FIELD_HIGH) << 128) + Into::<BigUint>::into(FIELD_LOW);
    pub static ref SIGNED_FELT_MAX: BigUint = &*CAIRO_PRIME >> 1_u32;
}

#[macro_export]
macro_rules! felt_str {
    ($val: expr) => {
        $crate::Felt252::parse_bytes($val.as_bytes(), 10_u32).expect("Couldn't parse bytes")
    };
    ($val: expr, $opt: expr) => {
        $crate::Felt252::parse_bytes($val.as_bytes(), $opt as u32).expect("Couldn't parse bytes")
    };
}

/// An element of the Cairo prime field, kept in Montgomery form.
#[derive(Clone, Deserialize, Serialize)]
#[serde(from = "BigInt")]
#[serde(into = "BigInt")]
pub struct Felt252 {
    value: FieldElement<Stark252PrimeField>,
}

impl Felt252 {
    pub fn new<T: Into<Felt252>>(value: T) -> Self {
        value.into()
    }

    pub fn iter_u64_digits(&self) -> impl Iterator<Item = u64> {
        self.value.representative().limbs.into_iter().rev()
    }

    pub fn to_be_digits(&self) -> [u64; 4] {
        self.value.representative().limbs
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0; 32];
        for (i, digit) in self.to_be_digits().into_iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&digit.to_be_bytes());
        }
        bytes
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self::from(BigUint::from_bytes_be(bytes))
    }

    pub fn parse_bytes(bytes: &[u8], radix: u32) -> Option<Self> {
        Some(BigInt::parse_bytes(bytes, radix)?.into())
    }

    pub fn to_biguint(&self) -> BigUint {
        let big_digits = self
            .iter_u64_digits()
            .flat_map(|limb| [limb as u32, (limb >> 32) as u32])
            .collect();
        BigUint::new(big_digits)
    }

    pub fn to_bigint(&self) -> BigInt {
        BigInt::from_biguint(Sign::Plus, self.to_biguint())
    }

    /// Lifts the element into the signed range `(-PRIME / 2, PRIME / 2)`.
    pub fn to_signed_felt(&self) -> BigInt {
        let biguint = self.to_biguint();
        if biguint > *SIGNED_FELT_MAX {
            BigInt::from_biguint(Sign::Minus, &*CAIRO_PRIME - &biguint)
        } else {
            biguint.to_bigint().expect("cannot fail")
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        match self.to_be_digits() {
            [0, 0, 0, low] => Some(low),
            _ => None,
        }
    }

    pub fn to_usize(&self) -> Option<usize> {
        self.to_u64().and_then(|n| n.try_into().ok())
    }

    pub fn to_u32(&self) -> Option<u32> {
        self.to_u64().and_then(|n| n.try_into().ok())
    }

    pub fn pow(&self, exp: u32) -> Self {
        Self {
            value: self.value.pow(exp),
        }
    }

    /// Raises the element to an exponent that is itself a field element,
    /// interpreted as an unsigned integer.
    pub fn pow_felt(&self, exp: &Felt252) -> Self {
        Self {
            value: self.value.pow(exp.value.representative()),
        }
    }

    /// Returns the smaller of the two square roots.
    /// Safety: must be called on a quadratic residue.
    pub fn sqrt(&self) -> Self {
        let (root_1, root_2) = self.value.sqrt().unwrap();
        let value = FieldElement::new(root_1.representative().min(root_2.representative()));
        Self { value }
    }

    pub fn bits(&self) -> u64 {
        match self.value.representative().limbs {
            [0, 0, 0, 0] => 0,
            [0, 0, 0, l0] => u64::BITS - l0.leading_zeros(),
            [0, 0, l1, _] => 2 * u64::BITS - l1.leading_zeros(),
            [0, l2, _, _] => 3 * u64::BITS - l2.leading_zeros(),
            [l3, _, _, _] => 4 * u64::BITS - l3.leading_zeros(),
        }
        .into()
    }

    pub fn is_odd(&self) -> bool {
        self.value.representative().limbs[3] & 1 == 1
    }

    pub fn prime() -> BigUint {
        CAIRO_PRIME.clone()
    }
}

macro_rules! from_num {
    ($type:ty, $cast:ty) => {
        impl From<$type> for Felt252 {
            fn from(value: $type) -> Self {
                let uplifted: $cast = value as $cast;
                uplifted.into()
            }
        }
    };
}

from_num!(usize, u64);
from_num!(u8, u64);
from_num!(u16, u64);
from_num!(u32, u64);
from_num!(isize, i64);
from_num!(i8, i64);
from_num!(i16, i64);
from_num!(i32, i64);

impl From<u64> for Felt252 {
    fn from(value: u64) -> Self {
        Self {
            value: FieldElement::new(UnsignedInteger::from_u64(value)),
        }
    }
}

impl From<u128> for Felt252 {
    fn from(value: u128) -> Self {
        Self {
            value: FieldElement::new(UnsignedInteger::from_u128(value)),
        }
    }
}

impl From<i64> for Felt252 {
    fn from(value: i64) -> Self {
        let value = if !value.is_negative() {
            FieldElement::new(UnsignedInteger::from_u64(value as u64))
        } else {
            let abs_minus_one = UnsignedInteger::from_u64(-(value + 1) as u64);
            FieldElement::zero() - FieldElement::one() - FieldElement::new(abs_minus_one)
        };
        Self { value }
    }
}

impl From<i128> for Felt252 {
    fn from(value: i128) -> Self {
        let value = if !value.is_negative() {
            FieldElement::new(UnsignedInteger::from_u128(value as u128))
        } else {
            let abs_minus_one = UnsignedInteger::from_u128(-(value + 1) as u128);
            FieldElement::zero() - FieldElement::one() - FieldElement::new(abs_minus_one)
        };
        Self { value }
    }
}

impl From<bool> for Felt252 {
    fn from(flag: bool) -> Self {
        if flag {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl From<BigUint> for Felt252 {
    fn from(mut value: BigUint) -> Self {
        if value >= *CAIRO_PRIME {
            value = value.mod_floor(&CAIRO_PRIME);
        }
        let mut limbs = [0; 4];
        for (i, l) in (0..4).rev().zip(value.iter_u64_digits()) {
            limbs[i] = l;
        }
        Self {
            value: FieldElement::new(UnsignedInteger::from_limbs(limbs)),
        }
    }
}

impl From<&BigUint> for Felt252 {
    fn from(value: &BigUint) -> Self {
        Self::from(value.clone())
    }
}

impl From<BigInt> for Felt252 {
    fn from(value: BigInt) -> Self {
        let val = value.mod_floor(&CAIRO_PRIME.to_bigint().expect("cannot fail"));
        let mut limbs = [0; 4];
        for (i, l) in (0..4).rev().zip(val.iter_u64_digits()) {
            limbs[i] = l;
        }
        Self {
            value: FieldElement::new(UnsignedInteger::from_limbs(limbs)),
        }
    }
}

impl From<&BigInt> for Felt252 {
    fn from(value: &BigInt) -> Self {
        Self::from(value.clone())
    }
}

impl From<Felt252> for BigInt {
    fn from(value: Felt252) -> Self {
        value.to_bigint()
    }
}

impl PartialEq for Felt252 {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Felt252 {}

impl Hash for Felt252 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.representative().limbs.hash(state)
    }
}

impl PartialOrd for Felt252 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Felt252 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .representative()
            .limbs
            .cmp(&other.value.representative().limbs)
    }
}

impl Add for Felt252 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
        }
    }
}

impl<'a> Add for &'a Felt252 {
    type Output = Felt252;
    fn add(self, rhs: Self) -> Self::Output {
        Self::Output {
            value: &self.value + &rhs.value,
        }
    }
}

impl<'a> Add<&'a Felt252> for Felt252 {
    type Output = Self;
    fn add(self, rhs: &Self) -> Self::Output {
        Self::Output {
            value: self.value + &rhs.value,
        }
    }
}

impl Add<usize> for Felt252 {
    type Output = Self;
    fn add(self, rhs: usize) -> Self {
        Self {
            value: self.value + FieldElement::new(UnsignedInteger::from_u64(rhs as u64)),
        }
    }
}

impl<'a> Add<usize> for &'a Felt252 {
    type Output = Felt252;
    fn add(self, rhs: usize) -> Self::Output {
        Self::Output {
            value: &self.value + FieldElement::new(UnsignedInteger::from_u64(rhs as u64)),
        }
    }
}

impl AddAssign for Felt252 {
    fn add_assign(&mut self, rhs: Self) {
        self.value = &self.value + &rhs.value;
    }
}

impl<'a> AddAssign<&'a Felt252> for Felt252 {
    fn add_assign(&mut self, rhs: &Self) {
        self.value = &self.value + &rhs.value;
    }
}

impl Sum for Felt252 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Felt252::zero(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

impl Neg for Felt252 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { value: -self.value }
    }
}

impl<'a> Neg for &'a Felt252 {
    type Output = Felt252;
    fn neg(self) -> Self::Output {
        Self::Output {
            value: -self.value.clone(),
        }
    }
}

impl Sub for Felt252 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
        }
    }
}

impl<'a> Sub for &'a Felt252 {
    type Output = Felt252;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            value: &self.value - &rhs.value,
        }
    }
}

impl<'a> Sub<&'a Felt252> for Felt252 {
    type Output = Self;
    fn sub(self, rhs: &Self) -> Self {
        Self {
            value: self.value - &rhs.value,
        }
    }
}

impl Mul for Felt252 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            value: self.value * rhs.value,
        }
    }
}

impl<'a> Mul for &'a Felt252 {
    type Output = Felt252;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Output {
            value: &self.value * &rhs.value,
        }
    }
}

impl<'a> Mul<&'a Felt252> for Felt252 {
    type Output = Self;
    fn mul(self, rhs: &Self) -> Self {
        Self {
            value: self.value * &rhs.value,
        }
    }
}

// Field division; callers are expected to rule out a zero divisor.
impl Div for Felt252 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self {
            value: self.value / rhs.value,
        }
    }
}

impl<'a> Div for &'a Felt252 {
    type Output = Felt252;
    fn div(self, rhs: Self) -> Self::Output {
        Self::Output {
            value: &self.value / &rhs.value,
        }
    }
}

impl<'a> Div<&'a Felt252> for Felt252 {
    type Output = Self;
    fn div(self, rhs: &Self) -> Self {
        Self {
            value: self.value / &rhs.value,
        }
    }
}

impl Zero for Felt252 {
    fn zero() -> Self {
        Self {
            value: FieldElement::zero(),
        }
    }

    fn is_zero(&self) -> bool {
        self.value == FieldElement::zero()
    }
}

impl One for Felt252 {
    fn one() -> Self {
        Self {
            value: FieldElement::one(),
        }
    }

    fn is_one(&self) -> bool {
        self.value == FieldElement::one()
    }
}

impl fmt::Display for Felt252 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

impl fmt::Debug for Felt252 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}
