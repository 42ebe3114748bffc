//! Digest primitives: SHA-256 rendered as bare 64-character lowercase hex.
//!
//! Content hashes, signatures, and spec-text hashes all share the [`Hex64`]
//! rendering. Structured values are digested over their canonical compact
//! encoding ([`value_digest`]), never over an ad-hoc serialization.

use sha2::{Digest, Sha256};

use crate::proof::canon::{self, canonical_json_bytes, CanonForm, EncodingError};

/// A 64-character lowercase hexadecimal digest or signature tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hex64(String);

impl Hex64 {
    /// Parse a digest string: exactly 64 lowercase hex characters.
    /// Returns `None` for anything else (uppercase included).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    /// The digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All-zero placeholder used while a bundle's real digest is computed.
    pub(crate) fn zeroed() -> Self {
        Self("0".repeat(64))
    }

    /// Render raw 32-byte digest output as lowercase hex.
    pub(crate) fn from_raw(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }
}

impl std::fmt::Display for Hex64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 over raw bytes, rendered lowercase hex.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> Hex64 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hex64::from_raw(&hasher.finalize())
}

/// Digest of a structured value: canonical compact encoding, then SHA-256.
///
/// # Errors
///
/// Returns [`EncodingError`] if the value cannot be canonically encoded.
pub fn value_digest(value: &serde_json::Value) -> Result<Hex64, EncodingError> {
    let bytes = canonical_json_bytes(value, CanonForm::Compact)?;
    Ok(sha256_hex(&bytes))
}

/// Digest of specification text, line endings normalized first.
///
/// The same specification content hashes identically on CRLF and LF
/// checkouts; this is what producers should stamp into `SpecInfo.specHash`.
#[must_use]
pub fn spec_text_digest(text: &str) -> Hex64 {
    sha256_hex(canon::normalize_line_endings(text).as_bytes())
}
