//! Bundle data model: the records a proof bundle is assembled from.
//!
//! Plain owned structs. JSON conversion is hand-written so that key order,
//! optional-field omission, and non-finite number normalization are decided
//! here rather than by a derive. Wire keys are camelCase; that layout is the
//! artifact contract and is locked by the round-trip tests.

use serde_json::{Map, Value};

use crate::proof::canon::{canonical_json_bytes, CanonForm, EncodingError};
use crate::proof::digest::{value_digest, Hex64};

/// Schema version stamped into every bundle and required of every parse.
pub const SCHEMA_VERSION: &str = "proofgate.bundle.v1";

// ---------------------------------------------------------------------------
// Closed enums
// ---------------------------------------------------------------------------

/// Aggregate outcome derived from claims and phase verdicts.
///
/// Never supplied by a caller; [`crate::proof::verdict::derive_verdict`] is
/// the only producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleVerdict {
    Proven,
    IncompleteProof,
    Violated,
    Unproven,
}

impl BundleVerdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proven => "PROVEN",
            Self::IncompleteProof => "INCOMPLETE_PROOF",
            Self::Violated => "VIOLATED",
            Self::Unproven => "UNPROVEN",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROVEN" => Some(Self::Proven),
            "INCOMPLETE_PROOF" => Some(Self::IncompleteProof),
            "VIOLATED" => Some(Self::Violated),
            "UNPROVEN" => Some(Self::Unproven),
            _ => None,
        }
    }
}

impl std::fmt::Display for BundleVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof status of a single claim. Closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Proven,
    NotProven,
    Violated,
    Unknown,
}

impl ClaimStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proven => "proven",
            Self::NotProven => "not_proven",
            Self::Violated => "violated",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proven" => Some(Self::Proven),
            "not_proven" => Some(Self::NotProven),
            "violated" => Some(Self::Violated),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a piece of evidence was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Test,
    Trace,
    StaticAnalysis,
    Smt,
    Manual,
}

impl EvidenceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Trace => "trace",
            Self::StaticAnalysis => "static_analysis",
            Self::Smt => "smt",
            Self::Manual => "manual",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "test" => Some(Self::Test),
            "trace" => Some(Self::Trace),
            "static_analysis" => Some(Self::StaticAnalysis),
            "smt" => Some(Self::Smt),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// The specification a bundle proves conformance to.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecInfo {
    pub domain: String,
    pub version: String,
    /// Digest of the specification text, line endings normalized
    /// ([`crate::proof::digest::spec_text_digest`]).
    pub spec_hash: Hex64,
    /// Relative path of the specification file, if the producer knows one.
    pub spec_path: Option<String>,
}

impl SpecInfo {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("domain".into(), Value::String(self.domain.clone()));
        obj.insert(
            "specHash".into(),
            Value::String(self.spec_hash.as_str().to_string()),
        );
        if let Some(spec_path) = &self.spec_path {
            obj.insert("specPath".into(), Value::String(spec_path.clone()));
        }
        obj.insert("version".into(), Value::String(self.version.clone()));
        Value::Object(obj)
    }
}

/// Outcome of one upstream pipeline phase.
///
/// The verdict deriver recognizes the phases `gate`, `build`, `test` and
/// `verify`; artifacts with any other phase name are preserved untouched but
/// never consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictArtifact {
    pub phase: String,
    /// Phase-specific verdict vocabulary; only the sentinels `reject`
    /// (gate) and `fail` (build/test) mean anything to the deriver.
    pub verdict: String,
    /// Optional numeric score. Non-finite values are treated as absent.
    pub score: Option<f64>,
    /// Free-form detail map, opaque except for the `totalTests` probe.
    pub details: Map<String, Value>,
    pub timestamp: String,
}

impl VerdictArtifact {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("details".into(), Value::Object(self.details.clone()));
        obj.insert("phase".into(), Value::String(self.phase.clone()));
        if let Some(score) = self.score {
            // A non-finite score has no canonical number form; it is
            // emitted as absent, which is also how a re-parse reads null.
            if score.is_finite() {
                obj.insert("score".into(), Value::from(score));
            }
        }
        obj.insert("timestamp".into(), Value::String(self.timestamp.clone()));
        obj.insert("verdict".into(), Value::String(self.verdict.clone()));
        Value::Object(obj)
    }
}

/// The engine's belief about one specification clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Clause identifier, unique within a bundle.
    pub id: String,
    /// Clause kind (precondition, postcondition, invariant, intent).
    /// Open vocabulary; preserved as given.
    pub kind: String,
    pub behavior: Option<String>,
    pub status: ClaimStatus,
    pub reason: Option<String>,
    pub trace_ids: Option<Vec<String>>,
    pub source_location: Option<String>,
}

impl Claim {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(behavior) = &self.behavior {
            obj.insert("behavior".into(), Value::String(behavior.clone()));
        }
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.insert("kind".into(), Value::String(self.kind.clone()));
        if let Some(reason) = &self.reason {
            obj.insert("reason".into(), Value::String(reason.clone()));
        }
        if let Some(source_location) = &self.source_location {
            obj.insert(
                "sourceLocation".into(),
                Value::String(source_location.clone()),
            );
        }
        obj.insert(
            "status".into(),
            Value::String(self.status.as_str().to_string()),
        );
        if let Some(trace_ids) = &self.trace_ids {
            obj.insert(
                "traceIds".into(),
                Value::Array(
                    trace_ids
                        .iter()
                        .map(|id| Value::String(id.clone()))
                        .collect(),
                ),
            );
        }
        Value::Object(obj)
    }
}

/// Pointer to an execution trace stored alongside the bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRef {
    pub trace_id: String,
    pub behavior: String,
    pub test: String,
    /// Path relative to the bundle's own root. Absolute paths and
    /// parent-directory escapes are rejected at parse time so bundles stay
    /// portable.
    pub trace_path: String,
    pub event_count: u64,
}

impl TraceRef {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("behavior".into(), Value::String(self.behavior.clone()));
        obj.insert("eventCount".into(), Value::from(self.event_count));
        obj.insert("test".into(), Value::String(self.test.clone()));
        obj.insert("traceId".into(), Value::String(self.trace_id.clone()));
        obj.insert("tracePath".into(), Value::String(self.trace_path.clone()));
        Value::Object(obj)
    }
}

/// Per-clause evaluation result. The engine stores and hashes the detail
/// payload opaquely; it never inspects its meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    pub claim_id: String,
    pub kind: EvidenceKind,
    pub satisfied: bool,
    /// Confidence in `[0,1]`.
    pub confidence: f64,
    pub detail: Value,
}

impl Evidence {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("claimId".into(), Value::String(self.claim_id.clone()));
        // Value::from maps a non-finite confidence to Null; the parser then
        // rejects it, since confidence is a required range-checked field.
        obj.insert("confidence".into(), Value::from(self.confidence));
        obj.insert("detail".into(), self.detail.clone());
        obj.insert(
            "kind".into(),
            Value::String(self.kind.as_str().to_string()),
        );
        obj.insert("satisfied".into(), Value::Bool(self.satisfied));
        Value::Object(obj)
    }
}

/// The finished, content-addressed proof artifact for one verification run.
///
/// Constructed exactly once by [`crate::proof::build::create_bundle`] and
/// never mutated afterwards. Verification operations are read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofBundle {
    pub schema_version: String,
    /// SHA-256 over the canonical compact encoding of everything except
    /// `contentHash` and `signature`.
    pub content_hash: Hex64,
    pub spec: SpecInfo,
    pub phase_verdicts: Vec<VerdictArtifact>,
    pub claims: Vec<Claim>,
    pub traces: Vec<TraceRef>,
    pub evidence: Vec<Evidence>,
    /// Derived by the verdict rules, never caller-supplied.
    pub verdict: BundleVerdict,
    /// Names the fact that decided the verdict (claim id, phase, count).
    pub verdict_reason: String,
    /// Caller-supplied RFC 3339 timestamp. The engine never reads a clock.
    pub created_at: String,
    pub signature: Option<Hex64>,
}

impl ProofBundle {
    pub(crate) fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "claims".into(),
            Value::Array(self.claims.iter().map(Claim::to_json_value).collect()),
        );
        obj.insert(
            "contentHash".into(),
            Value::String(self.content_hash.as_str().to_string()),
        );
        obj.insert("createdAt".into(), Value::String(self.created_at.clone()));
        obj.insert(
            "evidence".into(),
            Value::Array(self.evidence.iter().map(Evidence::to_json_value).collect()),
        );
        obj.insert(
            "phaseVerdicts".into(),
            Value::Array(
                self.phase_verdicts
                    .iter()
                    .map(VerdictArtifact::to_json_value)
                    .collect(),
            ),
        );
        obj.insert(
            "schemaVersion".into(),
            Value::String(self.schema_version.clone()),
        );
        if let Some(signature) = &self.signature {
            obj.insert(
                "signature".into(),
                Value::String(signature.as_str().to_string()),
            );
        }
        obj.insert("spec".into(), self.spec.to_json_value());
        obj.insert(
            "traces".into(),
            Value::Array(self.traces.iter().map(TraceRef::to_json_value).collect()),
        );
        obj.insert(
            "verdict".into(),
            Value::String(self.verdict.as_str().to_string()),
        );
        obj.insert(
            "verdictReason".into(),
            Value::String(self.verdict_reason.clone()),
        );
        Value::Object(obj)
    }

    /// The hash domain of this bundle: its JSON form minus `contentHash`
    /// and `signature`. Those two fields are stamped after hashing and are
    /// not part of their own preimage.
    #[must_use]
    pub fn hash_basis(&self) -> Value {
        let mut value = self.to_json_value();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("contentHash");
            obj.remove("signature");
        }
        value
    }

    /// Recompute the content digest from the hash basis.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError`] if the bundle cannot be canonically
    /// encoded (nesting beyond the encoder's depth bound).
    pub fn content_digest(&self) -> Result<Hex64, EncodingError> {
        value_digest(&self.hash_basis())
    }

    /// Serialize the bundle in canonical form. Pretty form is the storage
    /// encoding; compact form is the hashing encoding.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError`] if the bundle cannot be canonically
    /// encoded.
    pub fn to_canonical_bytes(&self, form: CanonForm) -> Result<Vec<u8>, EncodingError> {
        canonical_json_bytes(&self.to_json_value(), form)
    }
}
