//! # Constants & Keygen Configuration
//!
//! Every fixed parameter the attestation tooling depends on lives here:
//! curve parameters, bech32 prefixes, key lengths, and the environment
//! variable names the CLI reads. The runtime knobs are collected in
//! [`KeygenConfig`], which is passed explicitly into every orchestrator call.
//! Nothing in this crate reads the environment on its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::encoding::{self, EncodingError};

// ---------------------------------------------------------------------------
// Curve Parameters (secp256k1, SEC 2 v2 §2.4.1)
// ---------------------------------------------------------------------------

/// Human-readable curve name, used in logs.
pub const CURVE_NAME: &str = "secp256k1";

/// Field prime p = 2^256 - 2^32 - 977.
pub const FIELD_PRIME_HEX: &str =
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f";

/// Order n of the generator point.
pub const GROUP_ORDER_HEX: &str =
    "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

/// Curve coefficient b in y^2 = x^3 + b. The a coefficient is zero.
pub const CURVE_B: u32 = 7;

/// Generator x-coordinate.
pub const GENERATOR_X_HEX: &str =
    "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// Generator y-coordinate.
pub const GENERATOR_Y_HEX: &str =
    "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

// ---------------------------------------------------------------------------
// Key Encoding
// ---------------------------------------------------------------------------

/// Secret scalar length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// X-only public key length in bytes. No SEC1 prefix byte.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Bech32 prefix for encoded secret keys.
pub const SECRET_KEY_HRP: &str = "nsec";

/// Bech32 prefix for encoded x-only public keys.
pub const PUBLIC_KEY_HRP: &str = "npub";

/// Advisory printed after a fresh keypair. Storing the secret is somebody
/// else's job; we only point at it.
pub const DEFAULT_NEXT_STEP: &str =
    "encrypt the nsec with the secrets encryption utility before storing it; never commit it in plaintext";

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Overrides the secret key prefix in the CLI.
pub const ENV_SECRET_HRP: &str = "RUNSTR_SECRET_HRP";

/// Overrides the public key prefix in the CLI.
pub const ENV_PUBLIC_HRP: &str = "RUNSTR_PUBLIC_HRP";

/// Selects `text` or `json` output in the CLI.
pub const ENV_OUTPUT: &str = "RUNSTR_OUTPUT";

/// Overrides the advisory line in the CLI.
pub const ENV_NEXT_STEP: &str = "RUNSTR_NEXT_STEP";

/// Existing secret (hex or nsec) for the `derive` subcommand.
pub const ENV_ATTESTATION_SECRET: &str = "RUNSTR_ATTESTATION_SECRET";

// ---------------------------------------------------------------------------
// KeygenConfig
// ---------------------------------------------------------------------------

/// How a generated key report is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Labelled lines followed by the advisory, for a human at a terminal.
    #[default]
    Text,
    /// A single JSON object, for piping into other tooling.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected text or json)", other)),
        }
    }
}

/// Everything the key-generation pipeline needs to know, supplied by the
/// caller at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenConfig {
    /// Prefix for the encoded secret key.
    pub secret_hrp: String,

    /// Prefix for the encoded public key.
    pub public_hrp: String,

    /// Report format.
    pub output: OutputFormat,

    /// Advisory line naming the secret-storage step. `None` suppresses it.
    pub next_step: Option<String>,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            secret_hrp: SECRET_KEY_HRP.to_string(),
            public_hrp: PUBLIC_KEY_HRP.to_string(),
            output: OutputFormat::Text,
            next_step: Some(DEFAULT_NEXT_STEP.to_string()),
        }
    }
}

impl KeygenConfig {
    pub fn with_secret_hrp(mut self, hrp: impl Into<String>) -> Self {
        self.secret_hrp = hrp.into();
        self
    }

    pub fn with_public_hrp(mut self, hrp: impl Into<String>) -> Self {
        self.public_hrp = hrp.into();
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn with_next_step(mut self, next_step: Option<String>) -> Self {
        self.next_step = next_step;
        self
    }

    /// Check both prefixes are usable bech32 HRPs and that they differ.
    ///
    /// Identical prefixes would make a leaked secret indistinguishable from
    /// a public key at a glance.
    pub fn validate(&self) -> Result<(), EncodingError> {
        encoding::validate_hrp(&self.secret_hrp)?;
        encoding::validate_hrp(&self.public_hrp)?;
        if self.secret_hrp == self.public_hrp {
            return Err(EncodingError::InvalidHrp(format!(
                "secret and public prefixes must differ (both '{}')",
                self.secret_hrp
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[test]
    fn test_curve_constants_parse() {
        for hex_str in [FIELD_PRIME_HEX, GROUP_ORDER_HEX, GENERATOR_X_HEX, GENERATOR_Y_HEX] {
            assert_eq!(hex_str.len(), 64);
            assert!(BigUint::parse_bytes(hex_str.as_bytes(), 16).is_some());
        }
    }

    #[test]
    fn test_field_prime_matches_closed_form() {
        let p = BigUint::parse_bytes(FIELD_PRIME_HEX.as_bytes(), 16).unwrap();
        let expected = (BigUint::from(1u8) << 256u32)
            - (BigUint::from(1u8) << 32u32)
            - BigUint::from(977u32);
        assert_eq!(p, expected);
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = KeygenConfig::default();
        assert_eq!(cfg.secret_hrp, "nsec");
        assert_eq!(cfg.public_hrp, "npub");
        assert_eq!(cfg.output, OutputFormat::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_identical_prefixes_rejected() {
        let cfg = KeygenConfig::default().with_secret_hrp("npub");
        assert!(matches!(cfg.validate(), Err(EncodingError::InvalidHrp(_))));
    }

    #[test]
    fn test_uppercase_prefix_rejected() {
        let cfg = KeygenConfig::default().with_public_hrp("NPUB");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("TEXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
