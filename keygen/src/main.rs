// Copyright (c) 2026 RUNSTR Contributors. MIT License.
// See LICENSE for details.

//! # RUNSTR Attestation Key Tool
//!
//! Entry point for the `runstr-keygen` binary. Parses CLI arguments,
//! initializes logging, and hands an explicit configuration to the library.
//!
//! - `generate` — fresh keypair from the OS random source
//! - `derive`   — report for an existing secret
//! - `encode`   — hex key to bech32
//! - `decode`   — bech32 key to hex
//! - `version`  — print build version information
//!
//! Any failure is fatal: the process exits non-zero and the operator re-runs
//! it. Nothing is retried.

mod cli;
mod logging;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::OsRng;

use runstr_attest::{encoding, keygen, SecretKey};

use cli::{Commands, KeygenCli};

fn main() -> Result<()> {
    let cli = KeygenCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Derive(args) => derive(args),
        Commands::Encode(args) => encode(args),
        Commands::Decode(args) => decode(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Draws 32 bytes from the OS and prints the encoded keypair.
fn generate(args: cli::GenerateArgs) -> Result<()> {
    let config = args.report.to_config();
    tracing::info!(
        secret_hrp = %config.secret_hrp,
        public_hrp = %config.public_hrp,
        output = %config.output,
        "generating attestation keypair"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    keygen::run(&config, &mut OsRng, &mut out).context("attestation key generation failed")?;
    Ok(())
}

/// Prints the report for a secret the operator already holds.
fn derive(args: cli::DeriveArgs) -> Result<()> {
    let config = args.report.to_config();
    let secret = parse_secret(&args.secret, &config.secret_hrp)?;

    let keys = keygen::from_secret(&config, &secret).context("key derivation failed")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    keygen::emit(&keys, &config, &mut out).context("failed to write key report")?;
    Ok(())
}

/// Hex key in, bech32 out.
fn encode(args: cli::EncodeArgs) -> Result<()> {
    let encoded = encode_hex_key(&args.hrp, &args.hex)?;
    tracing::debug!(hrp = %args.hrp, "encoded key");
    writeln!(io::stdout(), "{}", encoded)?;
    Ok(())
}

/// Bech32 key in, prefix and hex out.
fn decode(args: cli::DecodeArgs) -> Result<()> {
    let (hrp, payload) = decode_bech32(&args.value, args.expect_hrp.as_deref())?;
    tracing::debug!(hrp = %hrp, bytes = payload.len(), "decoded key");

    let mut out = io::stdout();
    writeln!(out, "prefix : {}", hrp)?;
    writeln!(out, "hex    : {}", hex::encode(&payload))?;
    Ok(())
}

/// Accepts a secret as 64 hex characters or as bech32 under `secret_hrp`.
fn parse_secret(raw: &str, secret_hrp: &str) -> Result<SecretKey> {
    let secret_prefix = format!("{}1", secret_hrp);
    if raw.trim().to_ascii_lowercase().starts_with(&secret_prefix) {
        SecretKey::from_bech32(secret_hrp, raw)
    } else {
        SecretKey::from_hex(raw)
    }
    .context("could not parse the supplied secret key")
}

fn encode_hex_key(hrp: &str, hex_key: &str) -> Result<String> {
    let bytes =
        hex::decode(hex_key.trim()).with_context(|| format!("'{}' is not valid hex", hex_key))?;
    encoding::encode_key(hrp, &bytes)
        .with_context(|| format!("failed to encode key under prefix '{}'", hrp))
}

fn decode_bech32(value: &str, expect_hrp: Option<&str>) -> Result<(String, Vec<u8>)> {
    let (hrp, payload) = encoding::decode(value.trim()).context("invalid bech32 string")?;
    if let Some(expected) = expect_hrp {
        if hrp != expected {
            bail!("expected prefix '{}', got '{}'", expected, hrp);
        }
    }
    Ok((hrp, payload))
}

/// Prints version information to stdout.
fn print_version() {
    println!("runstr-keygen {}", env!("CARGO_PKG_VERSION"));
    println!("curve         {}", runstr_attest::config::CURVE_NAME);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
