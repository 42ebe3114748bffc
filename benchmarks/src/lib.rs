//! Shared helpers for proofgate benchmark suites.

use serde_json::{json, Map, Value};

use proofgate_kernel::proof::build::{create_bundle, BundleInput};
use proofgate_kernel::proof::digest::spec_text_digest;
use proofgate_kernel::proof::model::{
    Claim, ClaimStatus, Evidence, EvidenceKind, ProofBundle, SpecInfo, TraceRef, VerdictArtifact,
};

/// Build a deterministic input with `claim_count` claims, one evidence
/// record per claim, and one trace for every fourth claim.
///
/// All scores and confidences are dyadic fractions so the serialized text
/// is identical on every platform.
#[must_use]
pub fn scaled_input(claim_count: usize) -> BundleInput {
    let claims: Vec<Claim> = (0..claim_count)
        .map(|i| Claim {
            id: format!("bench.post.{i}"),
            kind: "postcondition".to_string(),
            behavior: Some(format!("behavior_{}", i % 8)),
            status: ClaimStatus::Proven,
            reason: None,
            trace_ids: if i % 4 == 0 {
                Some(vec![format!("trace-{i}")])
            } else {
                None
            },
            source_location: Some(format!("bench.isl:{}", i + 1)),
        })
        .collect();

    let traces: Vec<TraceRef> = (0..claim_count)
        .step_by(4)
        .map(|i| TraceRef {
            trace_id: format!("trace-{i}"),
            behavior: format!("behavior_{}", i % 8),
            test: format!("test_behavior_{i}"),
            trace_path: format!("traces/trace-{i}.json"),
            event_count: u64::try_from(i % 32 + 1).unwrap_or(1),
        })
        .collect();

    let evidence: Vec<Evidence> = (0..claim_count)
        .map(|i| Evidence {
            claim_id: format!("bench.post.{i}"),
            kind: if i % 2 == 0 {
                EvidenceKind::Test
            } else {
                EvidenceKind::Trace
            },
            satisfied: true,
            confidence: 0.5 + f64::from(u32::try_from(i % 8).unwrap_or(0)) / 16.0,
            detail: json!({ "assertions": i % 5 + 1, "test": format!("test_behavior_{i}") }),
        })
        .collect();

    let test_details = {
        let mut d = Map::new();
        d.insert("durationMs".to_string(), json!(120));
        d.insert("totalTests".to_string(), json!(claim_count));
        d
    };

    BundleInput {
        spec: SpecInfo {
            domain: "bench".to_string(),
            version: "1.0.0".to_string(),
            spec_hash: spec_text_digest("intent scale\nexpect stable throughput\n"),
            spec_path: Some("specs/bench.isl".to_string()),
        },
        phase_verdicts: vec![
            VerdictArtifact {
                phase: "gate".to_string(),
                verdict: "approve".to_string(),
                score: None,
                details: Map::new(),
                timestamp: "2025-06-01T11:59:00Z".to_string(),
            },
            VerdictArtifact {
                phase: "test".to_string(),
                verdict: "pass".to_string(),
                score: Some(0.9375),
                details: test_details,
                timestamp: "2025-06-01T11:59:30Z".to_string(),
            },
        ],
        claims,
        traces,
        evidence,
        created_at: Some("2025-06-01T12:00:00Z".to_string()),
        signing_secret: None,
    }
}

/// Build a finished bundle with `claim_count` claims.
///
/// # Panics
///
/// Panics if construction fails. Benchmark setup failures are fatal.
#[must_use]
pub fn scaled_bundle(claim_count: usize) -> ProofBundle {
    create_bundle(scaled_input(claim_count)).expect("scaled input builds")
}

/// The hash basis of a scaled bundle, for timing the encoder in isolation.
///
/// # Panics
///
/// Panics if construction fails.
#[must_use]
pub fn scaled_basis(claim_count: usize) -> Value {
    scaled_bundle(claim_count).hash_basis()
}
