use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::types::errors::math_errors::MathError;

/// Integer square root; the unique x with x^2 <= n < (x + 1)^2.
pub fn isqrt(n: &BigUint) -> BigUint {
    let mut x = n.clone();
    let mut y = (&x + 1_u32) >> 1_u32;
    while y < x {
        x = y;
        y = (&x + n.div_floor(&x)) >> 1_u32;
    }
    x
}

///Returns x, y, g such that g = x*a + y*b = gcd(a, b).
fn igcdex(num_a: &BigInt, num_b: &BigInt) -> (BigInt, BigInt, BigInt) {
    match (num_a, num_b) {
        (a, b) if a.is_zero() && b.is_zero() => (BigInt::zero(), BigInt::one(), BigInt::zero()),
        (a, _) if a.is_zero() => (BigInt::zero(), num_b.signum(), num_b.abs()),
        (_, b) if b.is_zero() => (num_a.signum(), BigInt::zero(), num_a.abs()),
        _ => {
            let mut a = num_a.abs();
            let x_sign = num_a.signum();
            let mut b = num_b.abs();
            let y_sign = num_b.signum();
            let (mut x, mut y, mut r, mut s) =
                (BigInt::one(), BigInt::zero(), BigInt::zero(), BigInt::one());
            let (mut c, mut q);
            while !b.is_zero() {
                (q, c) = a.div_mod_floor(&b);
                x -= &q * &r;
                y -= &q * &s;
                (a, b, r, s, x, y) = (b, c, x, y, r, s)
            }
            (x * x_sign, y * y_sign, a)
        }
    }
}

///Finds a nonnegative integer x < p such that (m * x) % p == n.
pub fn div_mod(n: &BigInt, m: &BigInt, p: &BigInt) -> Result<BigInt, MathError> {
    let (a, _, c) = igcdex(m, p);
    if !c.is_one() {
        return Err(MathError::DividedByZero);
    }
    Ok((n * a).mod_floor(p))
}

/// Gets two points on an elliptic curve mod p and returns their sum.
/// Assumes the points are given in affine form (x, y) and have different x
/// coordinates.
pub fn ec_add(
    point_a: (BigInt, BigInt),
    point_b: (BigInt, BigInt),
    prime: &BigInt,
) -> Result<(BigInt, BigInt), MathError> {
    let m = line_slope(&point_a, &point_b, prime)?;
    let x = (&m * &m - &point_a.0 - &point_b.0).mod_floor(prime);
    let y = (m * (point_a.0 - &x) - point_a.1).mod_floor(prime);
    Ok((x, y))
}

/// Computes the slope of the line connecting the two given EC points over
/// the field GF(p). Assumes the points have different x coordinates.
pub fn line_slope(
    point_a: &(BigInt, BigInt),
    point_b: &(BigInt, BigInt),
    prime: &BigInt,
) -> Result<BigInt, MathError> {
    debug_assert!(!(&point_a.0 - &point_b.0).is_multiple_of(prime));
    div_mod(
        &(&point_a.1 - &point_b.1),
        &(&point_a.0 - &point_b.0),
        prime,
    )
}

/// Doubles a point on an elliptic curve with the equation
/// y^2 = x^3 + alpha*x + beta mod p. Assumes y != 0.
pub fn ec_double(
    point: (BigInt, BigInt),
    alpha: &BigInt,
    prime: &BigInt,
) -> Result<(BigInt, BigInt), MathError> {
    let m = ec_double_slope(&point, alpha, prime)?;
    let x = ((&m * &m) - (2_i32 * &point.0)).mod_floor(prime);
    let y = (m * (point.0 - &x) - point.1).mod_floor(prime);
    Ok((x, y))
}

/// Computes the slope of the curve at the given point. Assumes y != 0.
pub fn ec_double_slope(
    point: &(BigInt, BigInt),
    alpha: &BigInt,
    prime: &BigInt,
) -> Result<BigInt, MathError> {
    debug_assert!(!point.1.is_multiple_of(prime));
    div_mod(
        &(3_i32 * &point.0 * &point.0 + alpha),
        &(2_i32 * &point.1),
        prime,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_traits::Num;

    fn stark_prime() -> BigInt {
        BigInt::from_str_radix(
            "3618502788666131213697322783095070105623107215331596699973092056135872020481",
            10,
        )
        .unwrap()
    }

    #[test]
    fn isqrt_small_values() {
        assert_eq!(isqrt(&BigUint::from(0_u32)), BigUint::from(0_u32));
        assert_eq!(isqrt(&BigUint::from(24_u32)), BigUint::from(4_u32));
        assert_eq!(isqrt(&BigUint::from(25_u32)), BigUint::from(5_u32));
        assert_eq!(isqrt(&BigUint::from(26_u32)), BigUint::from(5_u32));
    }

    #[test]
    fn div_mod_inverts_multiplication() {
        let p = stark_prime();
        let n = BigInt::from(12345_u32);
        let m = BigInt::from(67_u32);
        let x = div_mod(&n, &m, &p).unwrap();
        assert_eq!((m * x).mod_floor(&p), n.mod_floor(&p));
    }

    #[test]
    fn ec_double_then_add_matches_tripling() {
        // On the Stark curve: alpha = 1.
        let p = stark_prime();
        let alpha = BigInt::one();
        let gen = (
            BigInt::from_str_radix(
                "874739451078007766457464989774322083649278607533249481151382481072868806602",
                10,
            )
            .unwrap(),
            BigInt::from_str_radix(
                "152666792071518830868575557812948353041420400780739481342941381225525861407",
                10,
            )
            .unwrap(),
        );
        let doubled = ec_double(gen.clone(), &alpha, &p).unwrap();
        let tripled = ec_add(doubled.clone(), gen.clone(), &p).unwrap();
        let tripled_other_way = ec_add(gen, doubled, &p).unwrap();
        assert_eq!(tripled, tripled_other_way);
    }
}
