//! # secp256k1 Point Arithmetic
//!
//! Affine short-Weierstrass arithmetic on `y^2 = x^3 + 7` over the field
//! prime p. Points are an explicit two-variant enum, so every operation has
//! to say what it does with the identity.
//!
//! This is a straight, readable implementation over `BigUint`. It exists to
//! derive one public key per run; it is not constant time and should not be
//! used to handle secrets on a machine an attacker can observe.
//!
//! ```text
//! add(P, Q):
//!   O + Q = Q,  P + O = P
//!   x1 == x2 && y1 + y2 == 0  ->  O        (inverses, includes y == 0 doubling)
//!   P == Q                    ->  s = 3x^2 / 2y
//!   otherwise                 ->  s = (y2 - y1) / (x2 - x1)
//!   x3 = s^2 - x1 - x2
//!   y3 = s(x1 - x3) - y1
//! ```

use num_bigint::BigUint;
use num_traits::Zero;
use std::sync::OnceLock;

use crate::arith::{mod_add, mod_inverse, mod_mul, mod_sub};
use crate::config::{
    CURVE_B, CURVE_NAME, FIELD_PRIME_HEX, GENERATOR_X_HEX, GENERATOR_Y_HEX, GROUP_ORDER_HEX,
};

/// A curve point: the identity or an affine pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Point {
    /// The point at infinity.
    Infinity,
    /// A finite point.
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    /// Coordinates are stored as given. `Curve` reduces them mod p before
    /// comparing or combining, so `(x + p, y)` behaves as `(x, y)` under
    /// `add`/`negate`/`multiply`. `is_on_curve` and `==` see the raw values.
    pub fn affine(x: BigUint, y: BigUint) -> Self {
        Point::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    /// The x-coordinate, or `None` for the identity.
    pub fn x(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(x),
        }
    }

    /// The y-coordinate, or `None` for the identity.
    pub fn y(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { y, .. } => Some(y),
        }
    }
}

/// Domain parameters for a short-Weierstrass curve with `a = 0`.
#[derive(Debug)]
pub struct Curve {
    name: &'static str,
    p: BigUint,
    n: BigUint,
    b: BigUint,
    g: Point,
}

static SECP256K1: OnceLock<Curve> = OnceLock::new();

fn from_hex_const(hex_str: &str) -> BigUint {
    let parsed = BigUint::parse_bytes(hex_str.as_bytes(), 16);
    debug_assert!(parsed.is_some(), "curve constant is not hex: {}", hex_str);
    parsed.unwrap_or_default()
}

impl Curve {
    /// The process-wide secp256k1 parameters, built on first use.
    pub fn secp256k1() -> &'static Curve {
        SECP256K1.get_or_init(|| Curve {
            name: CURVE_NAME,
            p: from_hex_const(FIELD_PRIME_HEX),
            n: from_hex_const(GROUP_ORDER_HEX),
            b: BigUint::from(CURVE_B),
            g: Point::affine(from_hex_const(GENERATOR_X_HEX), from_hex_const(GENERATOR_Y_HEX)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field prime p.
    pub fn field_prime(&self) -> &BigUint {
        &self.p
    }

    /// Order n of the generator.
    pub fn order(&self) -> &BigUint {
        &self.n
    }

    /// Generator G.
    pub fn generator(&self) -> &Point {
        &self.g
    }

    /// `y^2 == x^3 + b (mod p)`. The identity is on every curve.
    pub fn is_on_curve(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                if *x >= self.p || *y >= self.p {
                    return false;
                }
                let lhs = mod_mul(y, y, &self.p);
                let x3 = mod_mul(&mod_mul(x, x, &self.p), x, &self.p);
                lhs == mod_add(&x3, &self.b, &self.p)
            }
        }
    }

    /// `-P = (x, p - y)`.
    pub fn negate(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => {
                Point::affine(x % &self.p, mod_sub(&BigUint::zero(), y, &self.p))
            }
        }
    }

    fn reduce(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::affine(x % &self.p, y % &self.p),
        }
    }

    /// Group law. Degenerate inputs resolve to the identity instead of
    /// dividing by zero.
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let (lhs, rhs) = (self.reduce(lhs), self.reduce(rhs));
        let (x1, y1, x2, y2) = match (&lhs, &rhs) {
            (Point::Infinity, _) => return rhs,
            (_, Point::Infinity) => return lhs,
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
        };
        let p = &self.p;

        if x1 == x2 && mod_add(y1, y2, p).is_zero() {
            return Point::Infinity;
        }

        let slope = if x1 == x2 {
            // x1 == x2 and not inverses, so y1 == y2 != 0: tangent.
            let numerator = mod_mul(&BigUint::from(3u8), &mod_mul(x1, x1, p), p);
            let denominator = mod_add(y1, y1, p);
            match mod_inverse(&denominator, p) {
                Some(inv) => mod_mul(&numerator, &inv, p),
                None => return Point::Infinity,
            }
        } else {
            let numerator = mod_sub(y2, y1, p);
            let denominator = mod_sub(x2, x1, p);
            match mod_inverse(&denominator, p) {
                Some(inv) => mod_mul(&numerator, &inv, p),
                None => return Point::Infinity,
            }
        };

        let x3 = mod_sub(&mod_sub(&mod_mul(&slope, &slope, p), x1, p), x2, p);
        let y3 = mod_sub(&mod_mul(&slope, &mod_sub(x1, &x3, p), p), y1, p);
        Point::affine(x3, y3)
    }

    /// `2P`.
    pub fn double(&self, point: &Point) -> Point {
        self.add(point, point)
    }

    /// `k * P` by double-and-add, least-significant bit first.
    ///
    /// The loop runs over at least as many bits as the group order has, so
    /// small scalars do not finish early. Individual steps still branch on
    /// the scalar bit and the bignum operations are variable time.
    pub fn multiply(&self, k: &BigUint, point: &Point) -> Point {
        let width = k.bits().max(self.n.bits());
        let mut result = Point::Infinity;
        let mut addend = point.clone();

        for i in 0..width {
            if k.bit(i) {
                result = self.add(&result, &addend);
            }
            addend = self.double(&addend);
        }

        result
    }

    /// `k * G`.
    pub fn multiply_generator(&self, k: &BigUint) -> Point {
        self.multiply(k, &self.g)
    }

    /// Recover the point with the given x-coordinate and even y, if `x` is
    /// on the curve. Uses `p ≡ 3 (mod 4)`, so `sqrt(a) = a^((p+1)/4)`.
    pub fn lift_x(&self, x: &BigUint) -> Option<Point> {
        if *x >= self.p {
            return None;
        }
        let p = &self.p;
        let rhs = mod_add(&mod_mul(&mod_mul(x, x, p), x, p), &self.b, p);
        let exponent = (p + 1u32) >> 2u32;
        let y = rhs.modpow(&exponent, p);
        if mod_mul(&y, &y, p) != rhs {
            return None;
        }
        let y = if y.bit(0) { p - &y } else { y };
        Some(Point::affine(x.clone(), y))
    }
}
