//! # Attestation Keys
//!
//! secp256k1 secret scalars and x-only public keys, the key shape Nostr
//! relays and clients expect.
//!
//! ```text
//! secret (32 bytes, big-endian k, 0 < k < n)
//!     -> k * G = (x, y)
//!     -> x as 32 big-endian bytes     (y is dropped)
//!     -> bech32("npub", x)
//! ```
//!
//! The public key is deliberately NOT a SEC1 compressed point: there is no
//! `0x02`/`0x03` prefix byte, and downstream verifiers assume an even y.
//!
//! ## Security considerations
//!
//! - Secret bytes are zeroized on drop.
//! - `SecretKey` does not implement `Serialize`, and its `Debug` output
//!   shows only the public key.
//! - Key bytes are never logged from this module.

use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::{PUBLIC_KEY_HRP, PUBLIC_KEY_LENGTH, SECRET_KEY_HRP, SECRET_KEY_LENGTH};
use crate::curve::{Curve, Point};
use crate::encoding::{self, EncodingError};

/// Errors that can occur while building or converting keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The scalar is zero or not below the group order.
    #[error("invalid secret key: scalar must be in [1, n-1]")]
    InvalidSecretKey,

    /// The x-coordinate is not on the curve.
    #[error("invalid public key: x-coordinate is not on secp256k1")]
    InvalidPublicKey,

    /// Raw key material had the wrong size.
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte count.
        expected: usize,
        /// Byte count supplied.
        got: usize,
    },

    /// Hex input did not decode.
    #[error("invalid hex key encoding")]
    InvalidHex,

    /// The random source failed before producing a full scalar.
    #[error("random source failed: {0}")]
    Randomness(String),

    /// Bech32 encoding or decoding failed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Derive the x-only public key for a 32-byte big-endian scalar.
///
/// The scalar is not range-checked; use [`SecretKey`] for that. A scalar
/// that maps to the identity (zero, or a multiple of n) yields 32 zero
/// bytes.
pub fn derive_public_key(secret: &[u8; SECRET_KEY_LENGTH]) -> [u8; PUBLIC_KEY_LENGTH] {
    let k = BigUint::from_bytes_be(secret);
    match Curve::secp256k1().multiply_generator(&k) {
        Point::Infinity => [0u8; PUBLIC_KEY_LENGTH],
        Point::Affine { x, .. } => to_fixed_bytes(&x),
    }
}

/// Left-zero-pad a value below 2^256 to 32 big-endian bytes.
fn to_fixed_bytes(value: &BigUint) -> [u8; 32] {
    let raw = value.to_bytes_be();
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(raw.len());
    out[start..].copy_from_slice(&raw[raw.len().saturating_sub(32)..]);
    out
}

fn slice_to_array(slice: &[u8]) -> Result<[u8; 32], KeyError> {
    slice.try_into().map_err(|_| KeyError::InvalidLength {
        expected: 32,
        got: slice.len(),
    })
}

// ---------------------------------------------------------------------------
// SecretKey
// ---------------------------------------------------------------------------

/// A secp256k1 secret scalar in `[1, n-1]`.
///
/// # Examples
///
/// ```
/// use runstr_attest::keys::SecretKey;
///
/// let mut one = [0u8; 32];
/// one[31] = 1;
/// let sk = SecretKey::from_bytes(&one).unwrap();
/// assert_eq!(
///     sk.public_key().to_hex(),
///     "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
/// );
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SECRET_KEY_LENGTH],
}

impl SecretKey {
    /// Draw 32 bytes from `rng` and use them as the scalar.
    ///
    /// One draw, no retries: a failing source or an out-of-range draw is
    /// returned as an error and the caller starts over.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        rng.try_fill_bytes(&mut bytes[..])
            .map_err(|e| KeyError::Randomness(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Validate and wrap a big-endian scalar.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let k = BigUint::from_bytes_be(bytes);
        if k.is_zero() || k >= *Curve::secp256k1().order() {
            return Err(KeyError::InvalidSecretKey);
        }
        Ok(Self { bytes: *bytes })
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(slice_to_array(slice)?);
        Self::from_bytes(&bytes)
    }

    /// Parse a 64-character hex secret.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?);
        Self::from_slice(&bytes)
    }

    /// Parse a bech32 secret carrying the given prefix.
    pub fn from_bech32(hrp: &str, s: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(encoding::decode_key(hrp, s.trim())?);
        Self::from_bytes(&bytes)
    }

    /// Parse an `nsec1…` string.
    pub fn from_nsec(s: &str) -> Result<Self, KeyError> {
        Self::from_bech32(SECRET_KEY_HRP, s)
    }

    pub fn public_key(&self) -> XOnlyPublicKey {
        XOnlyPublicKey {
            bytes: derive_public_key(&self.bytes),
        }
    }

    /// Raw scalar bytes. Handle with care.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Bech32 encoding under `hrp`.
    pub fn to_bech32(&self, hrp: &str) -> Result<String, KeyError> {
        Ok(encoding::encode_key(hrp, &self.bytes)?)
    }

    /// `nsec1…` encoding.
    pub fn to_nsec(&self) -> Result<String, KeyError> {
        self.to_bech32(SECRET_KEY_HRP)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(pub={})", self.public_key().to_hex())
    }
}

impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.bytes[..].ct_eq(&other.bytes[..])
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SecretKey {}

// ---------------------------------------------------------------------------
// XOnlyPublicKey
// ---------------------------------------------------------------------------

/// The 32-byte x-coordinate of a public point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct XOnlyPublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl XOnlyPublicKey {
    /// Wrap raw bytes without checking them against the curve.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Wrap a slice, checking length and that x lies on the curve.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let key = Self {
            bytes: slice_to_array(slice)?,
        };
        key.to_point().ok_or(KeyError::InvalidPublicKey)?;
        Ok(key)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidHex)?;
        Self::try_from_slice(&bytes)
    }

    pub fn from_bech32(hrp: &str, s: &str) -> Result<Self, KeyError> {
        let bytes = encoding::decode_key(hrp, s.trim())?;
        Self::try_from_slice(&bytes)
    }

    /// Parse an `npub1…` string.
    pub fn from_npub(s: &str) -> Result<Self, KeyError> {
        Self::from_bech32(PUBLIC_KEY_HRP, s)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn to_bech32(&self, hrp: &str) -> Result<String, KeyError> {
        Ok(encoding::encode_key(hrp, &self.bytes)?)
    }

    /// `npub1…` encoding.
    pub fn to_npub(&self) -> Result<String, KeyError> {
        self.to_bech32(PUBLIC_KEY_HRP)
    }

    /// The curve point with this x and an even y, if there is one.
    pub fn to_point(&self) -> Option<Point> {
        Curve::secp256k1().lift_x(&BigUint::from_bytes_be(&self.bytes))
    }
}

impl fmt::Display for XOnlyPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for XOnlyPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XOnlyPublicKey({})", &self.to_hex()[..16])
    }
}

impl Serialize for XOnlyPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.bytes)
        }
    }
}

impl<'de> Deserialize<'de> for XOnlyPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            XOnlyPublicKey::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            XOnlyPublicKey::try_from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const G_X_HEX: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const ORDER_MINUS_ONE_HEX: &str =
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140";

    fn scalar(last: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = last;
        bytes
    }

    /// An RNG that always fails, standing in for an exhausted entropy source.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
            Err(rand_core::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn derive_scalar_one_gives_generator_x() {
        assert_eq!(hex::encode(derive_public_key(&scalar(1))), G_X_HEX);
    }

    #[test]
    fn derive_order_minus_one_gives_generator_x() {
        // (n-1)G = -G shares G's x-coordinate.
        let bytes: [u8; 32] = hex::decode(ORDER_MINUS_ONE_HEX).unwrap().try_into().unwrap();
        assert_eq!(hex::encode(derive_public_key(&bytes)), G_X_HEX);
    }

    #[test]
    fn derive_zero_gives_zero_bytes() {
        assert_eq!(derive_public_key(&[0u8; 32]), [0u8; 32]);
    }

    #[test]
    fn derive_is_deterministic() {
        let secret = [0x5au8; 32];
        assert_eq!(derive_public_key(&secret), derive_public_key(&secret));
    }

    #[test]
    fn derive_matches_k256() {
        let mut rng = StdRng::seed_from_u64(0x52554e53);
        for _ in 0..8 {
            let sk = SecretKey::generate(&mut rng).unwrap();
            let reference = k256::SecretKey::from_slice(&sk.to_bytes()).unwrap();
            let encoded = reference.public_key().to_encoded_point(true);
            assert_eq!(sk.public_key().as_bytes()[..], encoded.x().unwrap()[..]);
        }
    }

    #[test]
    fn fixed_bytes_pads_short_values() {
        assert_eq!(to_fixed_bytes(&BigUint::from(1u8)), scalar(1));
        assert_eq!(to_fixed_bytes(&BigUint::zero()), [0u8; 32]);
    }

    #[test]
    fn secret_key_range_checked() {
        assert!(matches!(SecretKey::from_bytes(&[0u8; 32]), Err(KeyError::InvalidSecretKey)));
        assert!(matches!(SecretKey::from_bytes(&[0xffu8; 32]), Err(KeyError::InvalidSecretKey)));
        let order: [u8; 32] = hex::decode(crate::config::GROUP_ORDER_HEX)
            .unwrap()
            .try_into()
            .unwrap();
        assert!(matches!(SecretKey::from_bytes(&order), Err(KeyError::InvalidSecretKey)));
        assert!(SecretKey::from_hex(ORDER_MINUS_ONE_HEX).is_ok());
    }

    #[test]
    fn generate_surfaces_rng_failure() {
        assert!(matches!(SecretKey::generate(&mut BrokenRng), Err(KeyError::Randomness(_))));
    }

    #[test]
    fn generated_keys_differ() {
        let mut rng = rand::rngs::OsRng;
        let a = SecretKey::generate(&mut rng).unwrap();
        let b = SecretKey::generate(&mut rng).unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn secret_hex_and_nsec_roundtrip() {
        let sk = SecretKey::from_bytes(&scalar(1)).unwrap();
        assert_eq!(SecretKey::from_hex(&sk.to_hex()).unwrap().to_bytes(), scalar(1));
        let nsec = sk.to_nsec().unwrap();
        assert_eq!(nsec, "nsec1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqsmhltgl");
        assert_eq!(SecretKey::from_nsec(&nsec).unwrap().to_bytes(), scalar(1));
    }

    #[test]
    fn secrets_with_shared_x_are_not_equal() {
        // k and n-k give points with the same x-coordinate.
        let one = SecretKey::from_bytes(&scalar(1)).unwrap();
        let minus_one = SecretKey::from_hex(ORDER_MINUS_ONE_HEX).unwrap();
        assert_eq!(one.public_key(), minus_one.public_key());
        assert_ne!(one, minus_one);
        assert!(!bool::from(one.ct_eq(&minus_one)));
        assert_eq!(one, SecretKey::from_bytes(&scalar(1)).unwrap());
    }

    #[test]
    fn secret_from_npub_rejected() {
        let npub = SecretKey::from_bytes(&scalar(1)).unwrap().public_key().to_npub().unwrap();
        assert!(matches!(
            SecretKey::from_nsec(&npub),
            Err(KeyError::Encoding(EncodingError::UnexpectedHrp { .. }))
        ));
    }

    #[test]
    fn secret_wrong_length_rejected() {
        assert!(matches!(
            SecretKey::from_hex("deadbeef"),
            Err(KeyError::InvalidLength { expected: 32, got: 4 })
        ));
        assert!(matches!(SecretKey::from_hex("not-hex"), Err(KeyError::InvalidHex)));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let sk = SecretKey::from_bytes(&scalar(3)).unwrap();
        let debug = format!("{:?}", sk);
        assert!(debug.starts_with("SecretKey(pub="));
        assert!(!debug.contains(&sk.to_hex()));
    }

    #[test]
    fn public_key_npub_vector() {
        let pk = SecretKey::from_bytes(&scalar(1)).unwrap().public_key();
        assert_eq!(
            pk.to_npub().unwrap(),
            "npub10xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqpkge6d"
        );
        assert_eq!(XOnlyPublicKey::from_npub(&pk.to_npub().unwrap()).unwrap(), pk);
    }

    #[test]
    fn public_key_lifts_to_curve_point() {
        let sk = SecretKey::from_bytes(&scalar(2)).unwrap();
        let point = sk.public_key().to_point().unwrap();
        assert!(Curve::secp256k1().is_on_curve(&point));
    }

    #[test]
    fn public_key_off_curve_rejected() {
        let mut five = [0u8; 32];
        five[31] = 5;
        assert!(matches!(
            XOnlyPublicKey::try_from_slice(&five),
            Err(KeyError::InvalidPublicKey)
        ));
        assert!(XOnlyPublicKey::try_from_slice(&[1u8; 33]).is_err());
    }

    #[test]
    fn public_key_serde_as_hex() {
        let pk = SecretKey::from_bytes(&scalar(1)).unwrap().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", G_X_HEX));
        let back: XOnlyPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }
}
