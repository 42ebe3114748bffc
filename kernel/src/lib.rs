//! Proofgate Kernel: the deterministic core of Proofgate.
//!
//! # API Surface
//!
//! The kernel exposes the bundle lifecycle:
//!
//! - [`proof::build::create_bundle`] -- assemble a bundle from verification
//!   facts, derive its verdict, stamp its content hash, optionally sign it
//! - [`proof::parse::parse_bundle`] -- fail-closed parse of a serialized bundle
//! - [`proof::verify::verify_bundle`] -- recompute every integrity check and
//!   report all of them
//!
//! Everything underneath (canonical encoding, digests, signatures, verdict
//! derivation) is public too, because external tooling re-derives hashes.
//!
//! # Determinism
//!
//! Identical logical input produces byte-identical bundles on every
//! platform. No wall clock reads, no randomness, no map iteration order
//! leaks. Timestamps enter only as caller-supplied strings.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod proof;
