//! Proofgate Harness: filesystem persistence and reporting for proof bundles.
//!
//! The harness does NOT implement proof logic — it delegates to the kernel.
//! It owns the on-disk bundle directory layout (`store`) and the
//! human-readable rendering of verification reports (`report`).

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod report;
pub mod store;
