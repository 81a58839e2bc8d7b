// Copyright (c) 2026 RUNSTR Contributors. MIT License.
// See LICENSE for details.

//! # RUNSTR Attestation Keys — Core Library
//!
//! Generates the secp256k1 keypair RUNSTR uses to sign workout attestations
//! and encodes it the way Nostr clients expect: an x-only public key and
//! bech32 `nsec`/`npub` strings.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **arith** — modular add/sub/mul/inverse over a prime.
//! - **curve** — affine secp256k1 point arithmetic with an explicit identity.
//! - **keys** — secret scalars, x-only public keys, derivation.
//! - **encoding** — the bech32 codec.
//! - **keygen** — random bytes in, encoded report out.
//! - **config** — constants and the explicit [`KeygenConfig`].
//!
//! ## What this is not
//!
//! The curve code is a readable reference implementation, not a hardened
//! one. It is variable time. Anything that signs under load should use a
//! vetted library such as `k256`, which the tests here cross-check against.

pub mod arith;
pub mod config;
pub mod curve;
pub mod encoding;
pub mod keygen;
pub mod keys;

pub use config::{KeygenConfig, OutputFormat};
pub use curve::{Curve, Point};
pub use encoding::EncodingError;
pub use keygen::{GeneratedKeys, KeygenError};
pub use keys::{derive_public_key, KeyError, SecretKey, XOnlyPublicKey};
