//! Single source of truth for the canonical test bundle.
//!
//! Used by both the `bundle_fixture` binary and the in-process lock tests.
//! Any change here changes both, preventing silent drift between what the
//! cross-process harness produces and what the in-process tests expect.

use std::collections::BTreeMap;

use proofgate_harness::store::StoredBundle;
use proofgate_kernel::proof::build::{create_bundle, BundleInput};
use proofgate_kernel::proof::canon::CanonForm;
use proofgate_kernel::proof::digest::spec_text_digest;
use proofgate_kernel::proof::model::{
    Claim, ClaimStatus, Evidence, EvidenceKind, ProofBundle, SpecInfo, TraceRef, VerdictArtifact,
};
use serde_json::json;

/// Deterministic input covering every record type and every optional field.
///
/// Scores use dyadic fractions so the shortest float representation is
/// identical on every platform.
///
/// # Panics
///
/// Panics if the embedded detail maps are not JSON objects. These are
/// test-only invariants.
#[must_use]
pub fn sample_bundle_input() -> BundleInput {
    BundleInput {
        spec: SpecInfo {
            domain: "auth".to_string(),
            version: "1.0.0".to_string(),
            spec_hash: spec_text_digest("intent login\nexpect session token issued\n"),
            spec_path: Some("specs/auth.isl".to_string()),
        },
        phase_verdicts: vec![
            VerdictArtifact {
                phase: "gate".to_string(),
                verdict: "approve".to_string(),
                score: None,
                details: json!({ "policy": "default" }).as_object().unwrap().clone(),
                timestamp: "2025-06-01T11:59:00Z".to_string(),
            },
            VerdictArtifact {
                phase: "test".to_string(),
                verdict: "pass".to_string(),
                score: Some(0.9375),
                details: json!({ "totalTests": 7, "durationMs": 120 })
                    .as_object()
                    .unwrap()
                    .clone(),
                timestamp: "2025-06-01T11:59:30Z".to_string(),
            },
        ],
        claims: vec![
            Claim {
                id: "auth.post.1".to_string(),
                kind: "postcondition".to_string(),
                behavior: Some("login".to_string()),
                status: ClaimStatus::Proven,
                reason: None,
                trace_ids: Some(vec!["login-ok".to_string()]),
                source_location: Some("auth.isl:12".to_string()),
            },
            Claim {
                id: "auth.inv.1".to_string(),
                kind: "invariant".to_string(),
                behavior: None,
                status: ClaimStatus::Proven,
                reason: None,
                trace_ids: None,
                source_location: Some("auth.isl:20".to_string()),
            },
        ],
        traces: vec![TraceRef {
            trace_id: "login-ok".to_string(),
            behavior: "login".to_string(),
            test: "login_succeeds".to_string(),
            trace_path: "traces/login-ok.json".to_string(),
            event_count: 6,
        }],
        evidence: vec![
            Evidence {
                claim_id: "auth.post.1".to_string(),
                kind: EvidenceKind::Test,
                satisfied: true,
                confidence: 0.875,
                detail: json!({ "assertions": 3, "test": "login_succeeds" }),
            },
            Evidence {
                claim_id: "auth.inv.1".to_string(),
                kind: EvidenceKind::StaticAnalysis,
                satisfied: true,
                confidence: 1.0,
                detail: json!({ "analyzer": "flowcheck" }),
            },
        ],
        created_at: Some("2025-06-01T12:00:00Z".to_string()),
        signing_secret: None,
    }
}

/// Build the canonical test bundle.
///
/// # Panics
///
/// Panics if construction fails; the sample input is valid by construction.
#[must_use]
pub fn sample_bundle() -> ProofBundle {
    create_bundle(sample_bundle_input()).expect("sample input builds")
}

/// Deterministic payload for the sample bundle's one declared trace.
#[must_use]
pub fn sample_trace_payload() -> Vec<u8> {
    b"{\"events\":[\"request\",\"validate\",\"issue\",\"persist\",\"respond\",\"done\"]}".to_vec()
}

/// The sample bundle paired with its trace payload, ready for the store.
#[must_use]
pub fn sample_stored_bundle() -> StoredBundle {
    let mut traces = BTreeMap::new();
    traces.insert("login-ok".to_string(), sample_trace_payload());
    StoredBundle {
        bundle: sample_bundle(),
        traces,
    }
}

/// Serialize a bundle, apply a JSON-level mutation, and hand back the
/// mutated bytes. This is the sanctioned way to produce tampered manifests
/// for negative tests; call sites must not patch struct fields and restamp
/// hashes by hand unless the restamp itself is under test.
///
/// # Panics
///
/// Panics if the bundle cannot be serialized or re-serialized. These are
/// test-only invariants.
#[must_use]
pub fn mutated_manifest(
    bundle: &ProofBundle,
    modify: impl FnOnce(&mut serde_json::Value),
) -> Vec<u8> {
    let bytes = bundle
        .to_canonical_bytes(CanonForm::Compact)
        .expect("bundle serializes");
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");
    modify(&mut value);
    serde_json::to_vec(&value).expect("mutated JSON serializes")
}
