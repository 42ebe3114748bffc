//! Bundle construction: assemble, derive, hash, optionally sign.
//!
//! The builder is the only producer of [`ProofBundle`] values. It never
//! reads a wall clock; the creation timestamp is a required input so that
//! identical logical inputs produce identical bundles on any machine at any
//! time.

use std::collections::BTreeSet;

use crate::proof::canon::EncodingError;
use crate::proof::model::{
    Claim, Evidence, ProofBundle, SpecInfo, TraceRef, VerdictArtifact, SCHEMA_VERSION,
};
use crate::proof::digest::Hex64;
use crate::proof::sign::sign_digest;
use crate::proof::verdict::derive_verdict;

/// Everything a caller supplies to build one bundle.
///
/// `created_at` is deliberately an `Option` so that omission is an explicit,
/// reportable error rather than a defaulted clock read.
#[derive(Debug, Clone)]
pub struct BundleInput {
    pub spec: SpecInfo,
    pub phase_verdicts: Vec<VerdictArtifact>,
    pub claims: Vec<Claim>,
    pub traces: Vec<TraceRef>,
    pub evidence: Vec<Evidence>,
    /// RFC 3339 creation timestamp. Required; the builder never samples one.
    pub created_at: Option<String>,
    /// When present, the finished bundle is signed with this secret.
    pub signing_secret: Option<Vec<u8>>,
}

/// Error constructing a bundle. All variants abort construction; no partial
/// bundle is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleBuildError {
    /// The caller omitted (or blanked) the required creation timestamp.
    MissingTimestamp,
    /// Two claims share a clause id.
    DuplicateClaim { claim_id: String },
    /// The assembled bundle could not be canonically encoded.
    Encoding(EncodingError),
}

impl std::fmt::Display for BundleBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTimestamp => {
                write!(f, "creation timestamp is required and was not supplied")
            }
            Self::DuplicateClaim { claim_id } => {
                write!(f, "duplicate claim id: {claim_id}")
            }
            Self::Encoding(e) => write!(f, "encoding error: {e}"),
        }
    }
}

impl std::error::Error for BundleBuildError {}

impl From<EncodingError> for BundleBuildError {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}

/// Build a finished, hash-stamped, immutable bundle from a frozen snapshot
/// of upstream results.
///
/// For two logically-identical inputs (same field values, any map key
/// insertion order), the serialized output is byte-identical.
///
/// # Errors
///
/// - [`BundleBuildError::MissingTimestamp`] when `created_at` is absent or
///   blank.
/// - [`BundleBuildError::DuplicateClaim`] when two claims share an id; a
///   duplicate is never silently collapsed.
/// - [`BundleBuildError::Encoding`] when the assembled bundle cannot be
///   canonically encoded.
pub fn create_bundle(input: BundleInput) -> Result<ProofBundle, BundleBuildError> {
    let created_at = match input.created_at {
        Some(ts) if !ts.trim().is_empty() => ts,
        _ => return Err(BundleBuildError::MissingTimestamp),
    };

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for claim in &input.claims {
        if !seen.insert(claim.id.as_str()) {
            return Err(BundleBuildError::DuplicateClaim {
                claim_id: claim.id.clone(),
            });
        }
    }

    let (verdict, verdict_reason) = derive_verdict(&input.claims, &input.phase_verdicts);

    let mut bundle = ProofBundle {
        schema_version: SCHEMA_VERSION.to_string(),
        content_hash: Hex64::zeroed(),
        spec: input.spec,
        phase_verdicts: input.phase_verdicts,
        claims: input.claims,
        traces: input.traces,
        evidence: input.evidence,
        verdict,
        verdict_reason,
        created_at,
        signature: None,
    };

    // The placeholder hash is stripped from the basis, so stamping order
    // cannot influence the digest.
    bundle.content_hash = bundle.content_digest()?;
    if let Some(secret) = &input.signing_secret {
        bundle.signature = Some(sign_digest(&bundle.content_hash, secret));
    }

    Ok(bundle)
}
