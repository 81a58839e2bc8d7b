//! # Modular Arithmetic
//!
//! The handful of operations the curve code needs over a prime modulus.
//! Every result is normalized into `[0, m)`. Inputs may be unreduced.
//!
//! All functions require `m > 1`. In this crate `m` is always either the
//! secp256k1 field prime or the group order.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

/// `(a + b) mod m`.
pub fn mod_add(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a + b) % m
}

/// `(a - b) mod m`, never negative.
///
/// `BigUint` cannot go below zero, so when the reduced `b` exceeds the
/// reduced `a` the modulus is added before subtracting.
pub fn mod_sub(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    let a = a % m;
    let b = b % m;
    if a >= b {
        a - b
    } else {
        m - b + a
    }
}

/// `(a * b) mod m`.
pub fn mod_mul(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// Multiplicative inverse of `a` modulo `m` via the extended Euclidean
/// algorithm.
///
/// Returns `None` when `a ≡ 0 (mod m)` or, more generally, when `a` and `m`
/// share a factor. Curve code checks for the degenerate cases before it gets
/// here, so `None` only shows up on inputs that were never valid points.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let modulus = BigInt::from(m.clone());
    let mut old_r = BigInt::from(a % m);
    let mut r = modulus.clone();
    let mut old_s = BigInt::one();
    let mut s = BigInt::zero();

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }

    // old_s may be negative; fold it back into [0, m).
    (((old_s % &modulus) + &modulus) % &modulus).to_biguint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIELD_PRIME_HEX, GROUP_ORDER_HEX};

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn field_prime() -> BigUint {
        BigUint::parse_bytes(FIELD_PRIME_HEX.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(mod_add(&big(5), &big(9), &big(11)), big(3));
        assert_eq!(mod_add(&big(0), &big(0), &big(11)), big(0));
    }

    #[test]
    fn test_sub_never_negative() {
        assert_eq!(mod_sub(&big(3), &big(5), &big(11)), big(9));
        assert_eq!(mod_sub(&big(5), &big(5), &big(11)), big(0));
        assert_eq!(mod_sub(&big(0), &big(1), &big(11)), big(10));
    }

    #[test]
    fn test_sub_with_unreduced_inputs() {
        // 25 ≡ 3 and 38 ≡ 5 (mod 11)
        assert_eq!(mod_sub(&big(25), &big(38), &big(11)), big(9));
    }

    #[test]
    fn test_sub_near_field_prime() {
        let p = field_prime();
        let p_minus_one = &p - 1u32;
        assert_eq!(mod_sub(&big(0), &big(1), &p), p_minus_one);
    }

    #[test]
    fn test_mul_reduces() {
        assert_eq!(mod_mul(&big(7), &big(8), &big(11)), big(1));
    }

    #[test]
    fn test_inverse_small_prime() {
        for a in 1..11u64 {
            let inv = mod_inverse(&big(a), &big(11)).unwrap();
            assert_eq!(mod_mul(&big(a), &inv, &big(11)), big(1), "a = {}", a);
        }
    }

    #[test]
    fn test_inverse_of_zero_is_none() {
        assert_eq!(mod_inverse(&big(0), &big(11)), None);
        assert_eq!(mod_inverse(&big(22), &big(11)), None);
    }

    #[test]
    fn test_inverse_non_coprime_is_none() {
        assert_eq!(mod_inverse(&big(4), &big(12)), None);
    }

    #[test]
    fn test_inverse_over_field_and_order() {
        let p = field_prime();
        let n = BigUint::parse_bytes(GROUP_ORDER_HEX.as_bytes(), 16).unwrap();
        for m in [&p, &n] {
            let a = m - 2u32;
            let inv = mod_inverse(&a, m).unwrap();
            assert!(inv < *m);
            assert_eq!(mod_mul(&a, &inv, m), big(1));
        }
    }
}
