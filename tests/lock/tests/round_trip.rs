//! Round-trip lock tests: serialize → parse → re-serialize is the identity
//! on canonical bytes, and a round-tripped bundle still verifies.

use lock_tests::bundle_test_helpers::{sample_bundle, sample_bundle_input};
use proofgate_kernel::proof::build::create_bundle;
use proofgate_kernel::proof::canon::CanonForm;
use proofgate_kernel::proof::parse::parse_bundle;
use proofgate_kernel::proof::verify::{verify_bundle, SignatureCheck, VerifyOptions};

// --- Structural round trip ---

#[test]
fn parse_recovers_the_built_bundle() {
    let bundle = sample_bundle();

    let from_pretty = parse_bundle(&bundle.to_canonical_bytes(CanonForm::Pretty).unwrap()).unwrap();
    let from_compact =
        parse_bundle(&bundle.to_canonical_bytes(CanonForm::Compact).unwrap()).unwrap();

    assert_eq!(from_pretty, bundle);
    assert_eq!(from_compact, bundle);
}

#[test]
fn reserialization_is_byte_identical() {
    let bundle = sample_bundle();
    let pretty = bundle.to_canonical_bytes(CanonForm::Pretty).unwrap();
    let compact = bundle.to_canonical_bytes(CanonForm::Compact).unwrap();

    let parsed = parse_bundle(&pretty).unwrap();
    assert_eq!(parsed.to_canonical_bytes(CanonForm::Pretty).unwrap(), pretty);
    assert_eq!(
        parsed.to_canonical_bytes(CanonForm::Compact).unwrap(),
        compact
    );
}

#[test]
fn round_tripped_bundle_still_verifies() {
    let bundle = sample_bundle();
    let parsed = parse_bundle(&bundle.to_canonical_bytes(CanonForm::Pretty).unwrap()).unwrap();
    let report = verify_bundle(&parsed, &VerifyOptions::default()).unwrap();
    assert!(report.is_intact(), "round-tripped bundle is not intact");
}

// --- Signed round trip ---

#[test]
fn signed_bundle_survives_the_round_trip() {
    let mut input = sample_bundle_input();
    input.signing_secret = Some(b"lock-test-secret".to_vec());
    let bundle = create_bundle(input).unwrap();
    assert!(bundle.signature.is_some());

    let parsed = parse_bundle(&bundle.to_canonical_bytes(CanonForm::Pretty).unwrap()).unwrap();
    assert_eq!(parsed.signature, bundle.signature);

    let report = verify_bundle(
        &parsed,
        &VerifyOptions {
            secret: Some(b"lock-test-secret".to_vec()),
        },
    )
    .unwrap();
    assert_eq!(report.signature, SignatureCheck::Verified);
    assert!(report.is_intact());
}

// --- String normalization through the full pipeline ---

#[test]
fn crlf_in_input_strings_is_normalized_once_and_stays_stable() {
    let mut input = sample_bundle_input();
    input.claims[0].status = proofgate_kernel::proof::model::ClaimStatus::Violated;
    input.claims[0].reason = Some("expected token\r\ngot nothing\rat all".to_string());
    let bundle = create_bundle(input).unwrap();

    let compact = bundle.to_canonical_bytes(CanonForm::Compact).unwrap();
    let text = std::str::from_utf8(&compact).unwrap();
    assert!(text.contains("expected token\\ngot nothing\\nat all"));
    assert!(!text.contains("\\r"));

    // Idempotent: the parsed bundle re-serializes to the same bytes, so the
    // recomputed hash matches the stamped one.
    let parsed = parse_bundle(&compact).unwrap();
    assert_eq!(
        parsed.to_canonical_bytes(CanonForm::Compact).unwrap(),
        compact
    );
    let report = verify_bundle(&parsed, &VerifyOptions::default()).unwrap();
    assert!(report.is_intact());
}

// --- Non-finite normalization through the full pipeline ---

#[test]
fn non_finite_score_never_reaches_the_wire() {
    let mut input = sample_bundle_input();
    input.phase_verdicts[1].score = Some(f64::NAN);
    let bundle = create_bundle(input).unwrap();

    let compact = bundle.to_canonical_bytes(CanonForm::Compact).unwrap();
    let text = std::str::from_utf8(&compact).unwrap();
    assert!(!text.contains("score"), "wire bytes still carry a score");

    let parsed = parse_bundle(&compact).unwrap();
    assert_eq!(parsed.phase_verdicts[1].score, None);
    let report = verify_bundle(&parsed, &VerifyOptions::default()).unwrap();
    assert!(report.is_intact());
}

#[test]
fn absent_score_and_non_finite_score_hash_identically() {
    let mut with_nan = sample_bundle_input();
    with_nan.phase_verdicts[1].score = Some(f64::INFINITY);
    let mut absent = sample_bundle_input();
    absent.phase_verdicts[1].score = None;

    let a = create_bundle(with_nan).unwrap();
    let b = create_bundle(absent).unwrap();
    assert_eq!(a.content_hash, b.content_hash);
}
