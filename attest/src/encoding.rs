//! # Bech32 Key Encoding
//!
//! BIP-173 bech32 (not bech32m), as used by Nostr for `nsec`/`npub` keys:
//!
//! ```text
//! payload (8-bit)  -> regroup to 5-bit, zero-pad the tail
//! checksum         =  polymod(hrp_expand(hrp) ++ data ++ [0; 6]) ^ 1
//! string           =  hrp ++ "1" ++ charset[data ++ checksum]
//! ```
//!
//! The output must match every other bech32 encoder bit for bit, so the
//! constants here are fixed by the standard and not configurable.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::Bech32;
use thiserror::Error;

use crate::config::PUBLIC_KEY_LENGTH;

/// The 32-symbol bech32 alphabet, indexed by 5-bit value.
pub const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Separates the human-readable part from the data part.
pub const SEPARATOR: char = '1';

/// Number of checksum symbols appended to the data part.
pub const CHECKSUM_LENGTH: usize = 6;

/// BCH generator coefficients.
const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

/// Constant the final polymod is XORed with (bech32m uses 0x2bc830a3).
const BECH32_CONST: u32 = 1;

/// Maximum human-readable part length.
const MAX_HRP_LENGTH: usize = 83;

/// Errors from encoding or decoding bech32 strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The human-readable prefix is empty, too long, or has bad characters.
    #[error("invalid human-readable prefix: {0}")]
    InvalidHrp(String),

    /// A key payload was not the expected size.
    #[error("invalid payload length: expected {expected} bytes, got {got}")]
    InvalidPayloadLength {
        /// Required byte count.
        expected: usize,
        /// Byte count supplied.
        got: usize,
    },

    /// A value does not fit the source group width during regrouping.
    #[error("value {value} does not fit in {bits} bits")]
    InvalidGroupValue {
        /// Offending value.
        value: u8,
        /// Source group width.
        bits: u32,
    },

    /// The string failed bech32 parsing: separator, case, alphabet or
    /// checksum.
    #[error("bech32 decode error: {0}")]
    Decode(String),

    /// The decoded prefix is not the one the caller asked for.
    #[error("unexpected prefix: expected '{expected}', got '{got}'")]
    UnexpectedHrp {
        /// Prefix the caller required.
        expected: String,
        /// Prefix found in the string.
        got: String,
    },
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// Regroup a sequence of `from`-bit values into `to`-bit values, most
/// significant bit first. A short trailing group is filled with zero bits on
/// the right.
pub fn convert_bits(data: &[u8], from: u32, to: u32) -> Result<Vec<u8>, EncodingError> {
    let max_value: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        if u32::from(value) >> from != 0 {
            return Err(EncodingError::InvalidGroupValue { value, bits: from });
        }
        acc = ((acc << from) | u32::from(value)) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if bits > 0 {
        out.push(((acc << (to - bits)) & max_value) as u8);
    }

    Ok(out)
}

/// High 3 bits of each prefix character, a zero, then the low 5 bits of each.
fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 0x1f));
    out
}

/// BCH remainder over GF(32).
fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for value in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

/// Six checksum symbols for `hrp` and 5-bit `data`.
pub fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let values = hrp_expand(hrp)
        .into_iter()
        .chain(data.iter().copied())
        .chain([0u8; CHECKSUM_LENGTH]);
    let pm = polymod(values) ^ BECH32_CONST;

    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (i, symbol) in checksum.iter_mut().enumerate() {
        *symbol = ((pm >> (5 * (5 - i))) & 0x1f) as u8;
    }
    checksum
}

/// Check that `hrp` is 1..=83 printable ASCII characters with no uppercase.
///
/// Lowercase is required because the encoder emits lowercase data and a
/// mixed-case result would not decode.
pub fn validate_hrp(hrp: &str) -> Result<(), EncodingError> {
    if hrp.is_empty() {
        return Err(EncodingError::InvalidHrp("prefix is empty".to_string()));
    }
    if hrp.len() > MAX_HRP_LENGTH {
        return Err(EncodingError::InvalidHrp(format!(
            "prefix is {} characters, limit is {}",
            hrp.len(),
            MAX_HRP_LENGTH
        )));
    }
    if let Some(ch) = hrp.chars().find(|c| !(' '..='~').contains(c) || *c == ' ') {
        return Err(EncodingError::InvalidHrp(format!("character {:?} is not allowed", ch)));
    }
    if hrp.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(EncodingError::InvalidHrp(format!("'{}' must be lowercase", hrp)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode an arbitrary byte payload under `hrp`.
pub fn encode(hrp: &str, payload: &[u8]) -> Result<String, EncodingError> {
    validate_hrp(hrp)?;
    let data = convert_bits(payload, 8, 5)?;
    let checksum = create_checksum(hrp, &data);

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + CHECKSUM_LENGTH);
    out.push_str(hrp);
    out.push(SEPARATOR);
    out.extend(
        data.iter()
            .chain(checksum.iter())
            .map(|&v| CHARSET[usize::from(v)] as char),
    );
    Ok(out)
}

/// Encode a 32-byte key. Anything else is rejected before regrouping.
pub fn encode_key(hrp: &str, payload: &[u8]) -> Result<String, EncodingError> {
    if payload.len() != PUBLIC_KEY_LENGTH {
        return Err(EncodingError::InvalidPayloadLength {
            expected: PUBLIC_KEY_LENGTH,
            got: payload.len(),
        });
    }
    encode(hrp, payload)
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode a bech32 string into its lowercase prefix and byte payload.
///
/// Parsing and checksum verification are delegated to the `bech32` crate.
/// Uppercase input is accepted only when the whole string is uppercase.
pub fn decode(s: &str) -> Result<(String, Vec<u8>), EncodingError> {
    let checked = CheckedHrpstring::new::<Bech32>(s)
        .map_err(|e| EncodingError::Decode(e.to_string()))?;
    let hrp = checked.hrp().to_lowercase();
    Ok((hrp, checked.byte_iter().collect()))
}

/// Decode a 32-byte key and insist on the given prefix.
pub fn decode_key(expected_hrp: &str, s: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], EncodingError> {
    let (hrp, payload) = decode(s)?;
    if hrp != expected_hrp {
        return Err(EncodingError::UnexpectedHrp {
            expected: expected_hrp.to_string(),
            got: hrp,
        });
    }
    payload
        .as_slice()
        .try_into()
        .map_err(|_| EncodingError::InvalidPayloadLength {
            expected: PUBLIC_KEY_LENGTH,
            got: payload.len(),
        })
}
