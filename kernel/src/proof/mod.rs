//! Proof module: canonical encoding, content hashing, signing, and the
//! bundle lifecycle.
//!
//! Dependency direction: `canon` ← `digest` ← `model`, with `sign`,
//! `verdict`, `build`, `parse`, and `verify` layered on top. One-way only.

pub mod build;
pub mod canon;
pub mod digest;
pub mod model;
pub mod parse;
pub mod sign;
pub mod verdict;
pub mod verify;
