//! # CLI Interface
//!
//! Command-line structure for `runstr-keygen`, via `clap` derive. Every
//! knob that used to be an ambient environment variable is an explicit flag
//! here, with the environment variable as a fallback.

use clap::{Args, Parser, Subcommand};

use runstr_attest::config::{
    ENV_ATTESTATION_SECRET, ENV_NEXT_STEP, ENV_OUTPUT, ENV_PUBLIC_HRP, ENV_SECRET_HRP,
    PUBLIC_KEY_HRP, SECRET_KEY_HRP,
};
use runstr_attest::{KeygenConfig, OutputFormat};

use crate::logging::LogFormat;

/// RUNSTR attestation key tool.
///
/// Generates the secp256k1 keypair used to sign workout attestations and
/// converts keys between hex and bech32 (nsec/npub) forms.
#[derive(Parser, Debug)]
#[command(
    name = "runstr-keygen",
    about = "RUNSTR attestation key tool",
    version,
    propagate_version = true
)]
pub struct KeygenCli {
    /// Log output format. Logs go to stderr.
    #[arg(
        long,
        global = true,
        env = "RUNSTR_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Default log filter when RUST_LOG is unset.
    #[arg(
        long,
        global = true,
        default_value = "runstr_keygen=info,runstr_attest=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh attestation keypair from the OS random source.
    Generate(GenerateArgs),
    /// Re-derive the report for an existing secret key.
    Derive(DeriveArgs),
    /// Encode a 32-byte hex key as bech32.
    Encode(EncodeArgs),
    /// Decode a bech32 key to its prefix and hex bytes.
    Decode(DecodeArgs),
    /// Print version information and exit.
    Version,
}

/// Report options shared by `generate` and `derive`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Bech32 prefix for the secret key.
    #[arg(long, env = ENV_SECRET_HRP, default_value = SECRET_KEY_HRP)]
    pub secret_hrp: String,

    /// Bech32 prefix for the public key.
    #[arg(long, env = ENV_PUBLIC_HRP, default_value = PUBLIC_KEY_HRP)]
    pub public_hrp: String,

    /// Report format: text or json.
    #[arg(long, short = 'o', env = ENV_OUTPUT, default_value = "text")]
    pub output: OutputFormat,

    /// Replace the advisory line that follows the report.
    #[arg(long, env = ENV_NEXT_STEP)]
    pub next_step: Option<String>,

    /// Omit the advisory line entirely. Wins over `--next-step` and its
    /// environment variable.
    #[arg(long)]
    pub no_next_step: bool,
}

impl ReportArgs {
    /// Build the explicit configuration handed to the library.
    pub fn to_config(&self) -> KeygenConfig {
        let defaults = KeygenConfig::default();
        let next_step = if self.no_next_step {
            None
        } else {
            self.next_step.clone().or(defaults.next_step)
        };
        KeygenConfig::default()
            .with_secret_hrp(self.secret_hrp.clone())
            .with_public_hrp(self.public_hrp.clone())
            .with_output(self.output)
            .with_next_step(next_step)
    }
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the `derive` subcommand.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Existing secret key, as 64 hex characters or a bech32 string with
    /// the secret prefix. Prefer the environment variable over the flag so
    /// the secret stays out of shell history.
    #[arg(long, env = ENV_ATTESTATION_SECRET, hide_env_values = true)]
    pub secret: String,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the `encode` subcommand.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Bech32 prefix to encode under.
    #[arg(long, default_value = PUBLIC_KEY_HRP)]
    pub hrp: String,

    /// 32-byte key as 64 hex characters.
    pub hex: String,
}

/// Arguments for the `decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Bech32 string, e.g. an npub.
    pub value: String,

    /// Require this prefix.
    #[arg(long)]
    pub expect_hrp: Option<String>,
}
