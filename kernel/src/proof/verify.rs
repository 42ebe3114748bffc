//! Bundle verification: recompute everything checkable and report it all.
//!
//! Verification never stops at the first failure. Every check runs and the
//! report carries one result per check, so a caller sees a hash mismatch
//! and a verdict inconsistency in the same pass. Structural integrity
//! (schema, hash, signature) and the content verdict (what the bundle
//! claims about the software) are separate axes: an intact bundle can still
//! carry a `VIOLATED` verdict, and that is the bundle working as intended.

use crate::proof::canon::EncodingError;
use crate::proof::digest::Hex64;
use crate::proof::model::{BundleVerdict, ProofBundle};
use crate::proof::parse::{parse_bundle, BundleParseError};
use crate::proof::sign::verify_signature;
use crate::proof::verdict::derive_verdict;

/// Inputs the verifier may use beyond the bundle itself.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Shared secret for the HMAC signature check. `None` leaves a present
    /// signature unchecked rather than failing it.
    pub secret: Option<Vec<u8>>,
}

/// Outcome of re-deriving the content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashCheck {
    Verified,
    Mismatch { stored: Hex64, computed: Hex64 },
    /// The bundle never parsed, so there was nothing to hash.
    NotChecked,
}

/// Outcome of the signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Verified,
    Mismatch,
    /// The bundle carries no signature. Unsigned means unauthenticated,
    /// not invalid.
    Unsigned,
    /// A signature is present but no secret was supplied, or the bundle
    /// never parsed.
    NotChecked,
}

/// Outcome of re-deriving the verdict from the recorded claims and phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictCheck {
    Consistent,
    Inconsistent {
        stored: BundleVerdict,
        derived: BundleVerdict,
    },
    NotChecked,
}

/// Outcome of schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Valid,
    Invalid { error: BundleParseError },
}

/// One result per check, plus the re-derived content verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub schema: SchemaCheck,
    pub hash: HashCheck,
    pub signature: SignatureCheck,
    pub verdict: VerdictCheck,
    /// Verdict re-derived from the bundle's own claims and phase verdicts.
    /// `None` when the bundle never parsed.
    pub content_verdict: Option<BundleVerdict>,
    pub content_verdict_reason: Option<String>,
}

impl VerifyReport {
    /// Structural integrity only: the bundle is well-formed, its hash
    /// matches its content, its verdict matches its facts, and any checked
    /// signature verified. Says nothing about whether the software proved
    /// its claims; read [`VerifyReport::content_verdict`] for that.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        matches!(self.schema, SchemaCheck::Valid)
            && matches!(self.hash, HashCheck::Verified)
            && !matches!(self.signature, SignatureCheck::Mismatch)
            && matches!(self.verdict, VerdictCheck::Consistent)
    }
}

/// Verify a parsed bundle. Schema validity is implied by the parse.
///
/// # Errors
///
/// Returns [`EncodingError`] only if the bundle cannot be re-canonicalized
/// for hashing; check failures are reported in the [`VerifyReport`], not
/// as errors.
pub fn verify_bundle(
    bundle: &ProofBundle,
    options: &VerifyOptions,
) -> Result<VerifyReport, EncodingError> {
    let computed = bundle.content_digest()?;
    let hash = if computed == bundle.content_hash {
        HashCheck::Verified
    } else {
        HashCheck::Mismatch {
            stored: bundle.content_hash.clone(),
            computed,
        }
    };

    // The signature covers the stored hash, not the recomputed one. That
    // keeps the two checks independent: a wrong secret shows up here while
    // the hash check still passes, and tampered content shows up there
    // while a valid signature over the stored hash still verifies.
    let signature = match (&bundle.signature, &options.secret) {
        (None, _) => SignatureCheck::Unsigned,
        (Some(_), None) => SignatureCheck::NotChecked,
        (Some(sig), Some(secret)) => {
            if verify_signature(&bundle.content_hash, sig, secret) {
                SignatureCheck::Verified
            } else {
                SignatureCheck::Mismatch
            }
        }
    };

    let (derived, derived_reason) = derive_verdict(&bundle.claims, &bundle.phase_verdicts);
    let verdict = if derived == bundle.verdict {
        VerdictCheck::Consistent
    } else {
        VerdictCheck::Inconsistent {
            stored: bundle.verdict,
            derived,
        }
    };

    Ok(VerifyReport {
        schema: SchemaCheck::Valid,
        hash,
        signature,
        verdict,
        content_verdict: Some(derived),
        content_verdict_reason: Some(derived_reason),
    })
}

/// Verify a serialized bundle. A schema failure is itself a reported check
/// result; the remaining checks come back [`HashCheck::NotChecked`] and
/// friends because there is no parsed content to check.
///
/// # Errors
///
/// Returns [`EncodingError`] only if a parsed bundle cannot be
/// re-canonicalized for hashing.
pub fn verify_bundle_bytes(
    bytes: &[u8],
    options: &VerifyOptions,
) -> Result<VerifyReport, EncodingError> {
    match parse_bundle(bytes) {
        Ok(bundle) => verify_bundle(&bundle, options),
        Err(error) => Ok(VerifyReport {
            schema: SchemaCheck::Invalid { error },
            hash: HashCheck::NotChecked,
            signature: SignatureCheck::NotChecked,
            verdict: VerdictCheck::NotChecked,
            content_verdict: None,
            content_verdict_reason: None,
        }),
    }
}
