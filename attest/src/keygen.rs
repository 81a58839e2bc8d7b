//! # Attestation Keypair Generation
//!
//! The one linear pipeline the operator actually runs:
//!
//! ```text
//! 32 random bytes -> SecretKey -> XOnlyPublicKey
//!                 -> bech32(secret_hrp, secret), bech32(public_hrp, x)
//!                 -> report (text or JSON) -> writer
//! ```
//!
//! Each step either succeeds or ends the run. There is no partial output:
//! the whole report is rendered before a single byte is written, so a
//! failure never leaves half a keypair on the terminal.

use chrono::{DateTime, Utc};
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use std::io::Write;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::{KeygenConfig, OutputFormat, CURVE_NAME};
use crate::encoding::EncodingError;
use crate::keys::{KeyError, SecretKey, XOnlyPublicKey};

/// Errors from the key-generation pipeline. All of them are terminal.
#[derive(Debug, Error)]
pub enum KeygenError {
    /// Key construction failed (bad randomness, out-of-range scalar, ...).
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// The configured prefixes are unusable.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Writing the report failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// JSON rendering failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The encoded forms of one attestation keypair.
///
/// The encoded secret is wiped from memory when this is dropped.
pub struct GeneratedKeys {
    secret: Zeroizing<String>,
    public: String,
    public_key: XOnlyPublicKey,
    generated_at: DateTime<Utc>,
}

impl GeneratedKeys {
    /// Bech32-encoded secret key.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Bech32-encoded public key.
    pub fn public(&self) -> &str {
        &self.public
    }

    pub fn public_key(&self) -> &XOnlyPublicKey {
        &self.public_key
    }

    /// Lowercase hex of the x-only public key.
    pub fn public_hex(&self) -> String {
        self.public_key.to_hex()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

impl fmt::Debug for GeneratedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKeys")
            .field("public", &self.public)
            .field("generated_at", &self.generated_at)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh keypair from `rng` and encode it per `config`.
pub fn generate<R: RngCore + CryptoRng>(
    config: &KeygenConfig,
    rng: &mut R,
) -> Result<GeneratedKeys, KeygenError> {
    config.validate()?;
    let secret = SecretKey::generate(rng)?;
    tracing::debug!(curve = CURVE_NAME, "secret scalar drawn");
    from_secret(config, &secret)
}

/// Encode an existing secret the same way [`generate`] would.
pub fn from_secret(config: &KeygenConfig, secret: &SecretKey) -> Result<GeneratedKeys, KeygenError> {
    config.validate()?;
    let public_key = secret.public_key();
    let keys = GeneratedKeys {
        secret: Zeroizing::new(secret.to_bech32(&config.secret_hrp)?),
        public: public_key.to_bech32(&config.public_hrp)?,
        public_key,
        generated_at: Utc::now(),
    };

    tracing::info!(
        public_key = %public_key,
        public_hrp = %config.public_hrp,
        "attestation keypair derived"
    );
    Ok(keys)
}

/// Render the report as a string in the configured format.
pub fn render(keys: &GeneratedKeys, config: &KeygenConfig) -> Result<String, KeygenError> {
    match config.output {
        OutputFormat::Text => Ok(render_text(keys, config)),
        OutputFormat::Json => render_json(keys, config),
    }
}

fn render_text(keys: &GeneratedKeys, config: &KeygenConfig) -> String {
    let secret_label = format!("Private key ({})", config.secret_hrp);
    let public_label = format!("Public key ({})", config.public_hrp);
    let hex_label = "Public key (hex)".to_string();
    let width = secret_label.len().max(public_label.len()).max(hex_label.len());
    let public_hex = keys.public_hex();

    let mut out = String::from("RUNSTR attestation keypair\n\n");
    for (label, value) in [
        (secret_label, keys.secret()),
        (public_label, keys.public()),
        (hex_label, public_hex.as_str()),
    ] {
        out.push_str(&format!("  {:<width$} : {}\n", label, value, width = width));
    }
    if let Some(next_step) = &config.next_step {
        out.push_str(&format!("\nNext step: {}\n", next_step));
    }
    out
}

fn render_json(keys: &GeneratedKeys, config: &KeygenConfig) -> Result<String, KeygenError> {
    // Built by hand so that putting the secret into JSON is an explicit
    // choice here rather than a derive on the key type.
    let report = serde_json::json!({
        "secret": keys.secret(),
        "public": keys.public(),
        "public_hex": keys.public_hex(),
        "secret_hrp": config.secret_hrp,
        "public_hrp": config.public_hrp,
        "curve": CURVE_NAME,
        "generated_at": keys.generated_at(),
        "next_step": config.next_step,
    });
    let mut rendered = serde_json::to_string_pretty(&report)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write the rendered report to `out`.
pub fn emit<W: Write>(
    keys: &GeneratedKeys,
    config: &KeygenConfig,
    out: &mut W,
) -> Result<(), KeygenError> {
    let report = Zeroizing::new(render(keys, config)?);
    out.write_all(report.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Generate a keypair and write its report. The whole orchestrator.
pub fn run<R: RngCore + CryptoRng, W: Write>(
    config: &KeygenConfig,
    rng: &mut R,
    out: &mut W,
) -> Result<GeneratedKeys, KeygenError> {
    let keys = generate(config, rng)?;
    emit(&keys, config, out)?;
    tracing::info!(format = %config.output, "attestation key report written");
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NEXT_STEP;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ONE_NSEC: &str = "nsec1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqsmhltgl";
    const ONE_NPUB: &str = "npub10xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqpkge6d";
    const ONE_HEX: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn secret_one() -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SecretKey::from_bytes(&bytes).unwrap()
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn from_secret_produces_golden_strings() {
        let keys = from_secret(&KeygenConfig::default(), &secret_one()).unwrap();
        assert_eq!(keys.secret(), ONE_NSEC);
        assert_eq!(keys.public(), ONE_NPUB);
        assert_eq!(keys.public_hex(), ONE_HEX);
    }

    #[test]
    fn text_report_lists_all_three_and_advice() {
        let config = KeygenConfig::default();
        let keys = from_secret(&config, &secret_one()).unwrap();
        let mut out = Vec::new();
        emit(&keys, &config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(&format!("Private key (nsec) : {}", ONE_NSEC)));
        assert!(text.contains(&format!("Public key (npub)  : {}", ONE_NPUB)));
        assert!(text.contains(&format!("Public key (hex)   : {}", ONE_HEX)));
        assert!(text.contains(&format!("Next step: {}", DEFAULT_NEXT_STEP)));
    }

    #[test]
    fn text_report_without_advice() {
        let config = KeygenConfig::default().with_next_step(None);
        let keys = from_secret(&config, &secret_one()).unwrap();
        let text = render(&keys, &config).unwrap();
        assert!(!text.contains("Next step"));
    }

    #[test]
    fn json_report_is_parseable() {
        let config = KeygenConfig::default().with_output(OutputFormat::Json);
        let keys = from_secret(&config, &secret_one()).unwrap();
        let rendered = render(&keys, &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["secret"], ONE_NSEC);
        assert_eq!(value["public"], ONE_NPUB);
        assert_eq!(value["public_hex"], ONE_HEX);
        assert_eq!(value["curve"], "secp256k1");
    }

    #[test]
    fn custom_prefixes_are_used() {
        let config = KeygenConfig::default()
            .with_secret_hrp("tsec")
            .with_public_hrp("tpub");
        let keys = from_secret(&config, &secret_one()).unwrap();
        assert!(keys.secret().starts_with("tsec1"));
        assert!(keys.public().starts_with("tpub1"));
    }

    #[test]
    fn invalid_config_fails_before_randomness() {
        let config = KeygenConfig::default().with_public_hrp("nsec");
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(generate(&config, &mut rng), Err(KeygenError::Encoding(_))));
    }

    #[test]
    fn run_is_deterministic_for_seeded_rng() {
        let config = KeygenConfig::default();
        let a = run(&config, &mut StdRng::seed_from_u64(42), &mut Vec::new()).unwrap();
        let b = run(&config, &mut StdRng::seed_from_u64(42), &mut Vec::new()).unwrap();
        assert_eq!(a.secret(), b.secret());
        assert_eq!(a.public(), b.public());
    }

    #[test]
    fn run_surfaces_write_failure() {
        let config = KeygenConfig::default();
        let err = run(&config, &mut StdRng::seed_from_u64(7), &mut FailingWriter).unwrap_err();
        assert!(matches!(err, KeygenError::Output(_)));
    }

    #[test]
    fn debug_hides_secret() {
        let keys = from_secret(&KeygenConfig::default(), &secret_one()).unwrap();
        let debug = format!("{:?}", keys);
        assert!(debug.contains(ONE_NPUB));
        assert!(!debug.contains(ONE_NSEC));
    }
}
