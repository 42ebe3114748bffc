//! Tamper sensitivity lock tests.
//!
//! Any single mutated field must surface as a content hash mismatch, and
//! every check reports independently: a tampered body does not disturb the
//! signature check, a wrong secret does not disturb the hash check.

use lock_tests::bundle_test_helpers::{mutated_manifest, sample_bundle, sample_bundle_input};
use proofgate_kernel::proof::build::create_bundle;
use proofgate_kernel::proof::model::BundleVerdict;
use proofgate_kernel::proof::verify::{
    verify_bundle, verify_bundle_bytes, HashCheck, SchemaCheck, SignatureCheck, VerdictCheck,
    VerifyOptions,
};
use serde_json::{json, Value};

fn no_secret() -> VerifyOptions {
    VerifyOptions::default()
}

// --- Hash sensitivity: one field, one mismatch ---

#[test]
fn every_single_field_mutation_is_caught_by_the_hash() {
    let bundle = sample_bundle();

    let mutations: Vec<(&str, Box<dyn Fn(&mut Value)>)> = vec![
        (
            "claim status flipped",
            Box::new(|v| v["claims"][0]["status"] = json!("violated")),
        ),
        (
            "phase score nudged",
            Box::new(|v| v["phaseVerdicts"][1]["score"] = json!(0.9376)),
        ),
        (
            "created_at shifted",
            Box::new(|v| v["createdAt"] = json!("2025-06-01T12:00:01Z")),
        ),
        (
            "evidence satisfied flipped",
            Box::new(|v| v["evidence"][0]["satisfied"] = json!(false)),
        ),
        (
            "opaque detail payload edited",
            Box::new(|v| v["evidence"][0]["detail"]["assertions"] = json!(4)),
        ),
        (
            "spec domain renamed",
            Box::new(|v| v["spec"]["domain"] = json!("billing")),
        ),
        (
            "trace event count changed",
            Box::new(|v| v["traces"][0]["eventCount"] = json!(7)),
        ),
        (
            "verdict reason reworded",
            Box::new(|v| v["verdictReason"] = json!("all 2 claims proven.")),
        ),
    ];

    for (label, modify) in mutations {
        let bytes = mutated_manifest(&bundle, modify);
        let report = verify_bundle_bytes(&bytes, &no_secret()).unwrap();
        assert_eq!(
            report.schema,
            SchemaCheck::Valid,
            "{label}: mutation should stay schema-valid"
        );
        assert!(
            matches!(report.hash, HashCheck::Mismatch { .. }),
            "{label}: hash check missed the mutation"
        );
        assert!(!report.is_intact(), "{label}: report claims intact");
    }
}

#[test]
fn untampered_manifest_still_passes_after_reencoding() {
    // Control case: mutated_manifest with no mutation re-encodes through
    // serde_json (different whitespace, same content) and must verify.
    let bundle = sample_bundle();
    let bytes = mutated_manifest(&bundle, |_| {});
    let report = verify_bundle_bytes(&bytes, &no_secret()).unwrap();
    assert_eq!(report.hash, HashCheck::Verified);
    assert!(report.is_intact());
}

// --- Check independence ---

#[test]
fn tampered_body_does_not_disturb_the_signature_check() {
    let mut input = sample_bundle_input();
    input.signing_secret = Some(b"secret-a".to_vec());
    let bundle = create_bundle(input).unwrap();

    let bytes = mutated_manifest(&bundle, |v| {
        v["claims"][0]["status"] = json!("violated");
    });
    let report = verify_bundle_bytes(
        &bytes,
        &VerifyOptions {
            secret: Some(b"secret-a".to_vec()),
        },
    )
    .unwrap();

    // The signature covers the stored hash, which was not touched.
    assert!(matches!(report.hash, HashCheck::Mismatch { .. }));
    assert_eq!(report.signature, SignatureCheck::Verified);
    assert!(!report.is_intact());
}

#[test]
fn wrong_secret_does_not_disturb_the_hash_check() {
    let mut input = sample_bundle_input();
    input.signing_secret = Some(b"secret-a".to_vec());
    let bundle = create_bundle(input).unwrap();

    let report = verify_bundle(
        &bundle,
        &VerifyOptions {
            secret: Some(b"secret-b".to_vec()),
        },
    )
    .unwrap();

    assert_eq!(report.hash, HashCheck::Verified);
    assert_eq!(report.verdict, VerdictCheck::Consistent);
    assert_eq!(report.signature, SignatureCheck::Mismatch);
    assert!(!report.is_intact());
}

// --- Restamped lies ---

#[test]
fn restamped_hash_cannot_hide_a_verdict_lie() {
    // An attacker who edits the verdict AND recomputes the hash defeats
    // the hash check, but the verdict is re-derived from the recorded
    // facts and still disagrees.
    let mut bundle = sample_bundle();
    bundle.verdict = BundleVerdict::Violated;
    bundle.content_hash = bundle.content_digest().unwrap();

    let report = verify_bundle(&bundle, &no_secret()).unwrap();
    assert_eq!(report.hash, HashCheck::Verified);
    assert_eq!(
        report.verdict,
        VerdictCheck::Inconsistent {
            stored: BundleVerdict::Violated,
            derived: BundleVerdict::Proven,
        }
    );
    assert_eq!(report.content_verdict, Some(BundleVerdict::Proven));
    assert!(!report.is_intact());
}

#[test]
fn restamped_hash_cannot_forge_a_signature() {
    let mut input = sample_bundle_input();
    input.signing_secret = Some(b"secret-a".to_vec());
    let mut bundle = create_bundle(input).unwrap();

    // Tamper and restamp the hash, leaving the old signature in place.
    bundle.claims[0].status = proofgate_kernel::proof::model::ClaimStatus::Violated;
    bundle.content_hash = bundle.content_digest().unwrap();

    let report = verify_bundle(
        &bundle,
        &VerifyOptions {
            secret: Some(b"secret-a".to_vec()),
        },
    )
    .unwrap();

    // The old signature no longer covers the restamped hash.
    assert_eq!(report.hash, HashCheck::Verified);
    assert_eq!(report.signature, SignatureCheck::Mismatch);
    assert!(!report.is_intact());
}

// --- Accumulation: multiple findings in one pass ---

#[test]
fn one_pass_reports_every_finding() {
    let bundle = sample_bundle();
    let bytes = mutated_manifest(&bundle, |v| {
        v["claims"][0]["status"] = json!("violated");
    });
    let report = verify_bundle_bytes(&bytes, &no_secret()).unwrap();

    // The same mutation trips the hash check and the verdict check; both
    // land in one report.
    assert!(matches!(report.hash, HashCheck::Mismatch { .. }));
    assert_eq!(
        report.verdict,
        VerdictCheck::Inconsistent {
            stored: BundleVerdict::Proven,
            derived: BundleVerdict::Violated,
        }
    );
    assert_eq!(report.content_verdict, Some(BundleVerdict::Violated));
}
