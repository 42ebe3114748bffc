//! Verdict derivation: claims + phase outcomes in, one verdict out.
//!
//! Rules are evaluated in priority order and the first match wins; the
//! conditions are never combined. Outright failure (violated claims, gate
//! rejection, build/test failure) is ruled out before partial evidence is
//! considered, and "no evidence at all" is distinguished from "some
//! evidence, inconclusive". The returned reason names the fact that fired,
//! not a canned per-verdict message.

use serde_json::Value;

use crate::proof::model::{BundleVerdict, Claim, ClaimStatus, VerdictArtifact};

const PHASE_GATE: &str = "gate";
const PHASE_BUILD: &str = "build";
const PHASE_TEST: &str = "test";

/// Gate-phase verdict that forces `VIOLATED` (the policy firewall's
/// vocabulary; build and test use `fail`).
const GATE_REJECT: &str = "reject";
const PHASE_FAIL: &str = "fail";

/// Detail key the test phase reports its total test count under.
const TOTAL_TESTS_KEY: &str = "totalTests";

/// Derive the overall verdict and its justification.
///
/// Rule order:
/// 1. any violated claim            -> `VIOLATED`
/// 2. gate phase verdict `reject`   -> `VIOLATED`
/// 3. build phase verdict `fail`    -> `VIOLATED`
/// 4. test phase verdict `fail`     -> `VIOLATED`
/// 5. any unknown/not_proven claim  -> `INCOMPLETE_PROOF`
/// 6. test phase ran zero tests     -> `INCOMPLETE_PROOF`
/// 7. no claims at all              -> `UNPROVEN`
/// 8. otherwise                     -> `PROVEN`
///
/// Artifacts whose phase is not one of `gate`/`build`/`test` never
/// participate; they are carried in the bundle untouched.
#[must_use]
pub fn derive_verdict(
    claims: &[Claim],
    phase_verdicts: &[VerdictArtifact],
) -> (BundleVerdict, String) {
    let violated: Vec<&str> = claims
        .iter()
        .filter(|c| c.status == ClaimStatus::Violated)
        .map(|c| c.id.as_str())
        .collect();
    if let Some(first) = violated.first() {
        let reason = if violated.len() == 1 {
            format!("claim '{first}' is violated")
        } else {
            format!("{} claims are violated, including '{first}'", violated.len())
        };
        return (BundleVerdict::Violated, reason);
    }

    if phase_verdict_is(phase_verdicts, PHASE_GATE, GATE_REJECT) {
        return (
            BundleVerdict::Violated,
            format!("gate phase verdict is '{GATE_REJECT}'"),
        );
    }
    if phase_verdict_is(phase_verdicts, PHASE_BUILD, PHASE_FAIL) {
        return (
            BundleVerdict::Violated,
            format!("build phase verdict is '{PHASE_FAIL}'"),
        );
    }
    if phase_verdict_is(phase_verdicts, PHASE_TEST, PHASE_FAIL) {
        return (
            BundleVerdict::Violated,
            format!("test phase verdict is '{PHASE_FAIL}'"),
        );
    }

    let unresolved: Vec<&Claim> = claims
        .iter()
        .filter(|c| matches!(c.status, ClaimStatus::Unknown | ClaimStatus::NotProven))
        .collect();
    if let Some(first) = unresolved.first() {
        let reason = if unresolved.len() == 1 {
            format!(
                "claim '{}' has status '{}'",
                first.id,
                first.status.as_str()
            )
        } else {
            format!(
                "{} claims are unresolved, including '{}' (status '{}')",
                unresolved.len(),
                first.id,
                first.status.as_str()
            )
        };
        return (BundleVerdict::IncompleteProof, reason);
    }

    if test_phase_reports_zero_tests(phase_verdicts) {
        return (
            BundleVerdict::IncompleteProof,
            "test phase reports zero tests run".to_string(),
        );
    }

    if claims.is_empty() {
        return (
            BundleVerdict::Unproven,
            "no claims are present".to_string(),
        );
    }

    (
        BundleVerdict::Proven,
        format!("all {} claims proven", claims.len()),
    )
}

fn phase_verdict_is(artifacts: &[VerdictArtifact], phase: &str, verdict: &str) -> bool {
    artifacts
        .iter()
        .any(|a| a.phase == phase && a.verdict == verdict)
}

fn test_phase_reports_zero_tests(artifacts: &[VerdictArtifact]) -> bool {
    artifacts.iter().filter(|a| a.phase == PHASE_TEST).any(|a| {
        a.details
            .get(TOTAL_TESTS_KEY)
            .and_then(Value::as_i64)
            == Some(0)
    })
}
