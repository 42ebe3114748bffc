//! Verification report rendering: one line per check, stable wording.
//!
//! The rendering is a derived view. The [`VerifyReport`] is authoritative;
//! callers making decisions should read it directly, not this text.

use std::fmt::Write as _;

use proofgate_kernel::proof::verify::{
    HashCheck, SchemaCheck, SignatureCheck, VerdictCheck, VerifyReport,
};

/// Render a verification report as human-readable text.
///
/// One line per check, then the content verdict, then the overall result.
/// Deterministic for a given report.
#[must_use]
pub fn render_verify_report(report: &VerifyReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "schema     {}", schema_line(&report.schema));
    let _ = writeln!(out, "hash       {}", hash_line(&report.hash));
    let _ = writeln!(out, "signature  {}", signature_line(&report.signature));
    let _ = writeln!(out, "verdict    {}", verdict_line(&report.verdict));

    match (&report.content_verdict, &report.content_verdict_reason) {
        (Some(verdict), Some(reason)) => {
            let _ = writeln!(out, "content    {} ({reason})", verdict.as_str());
        }
        _ => {
            let _ = writeln!(out, "content    not available");
        }
    }

    let result = if report.is_intact() {
        "intact"
    } else {
        "not intact"
    };
    let _ = writeln!(out, "result     {result}");

    out
}

fn schema_line(check: &SchemaCheck) -> String {
    match check {
        SchemaCheck::Valid => "valid".to_string(),
        SchemaCheck::Invalid { error } => format!("invalid ({error})"),
    }
}

fn hash_line(check: &HashCheck) -> String {
    match check {
        HashCheck::Verified => "verified".to_string(),
        HashCheck::Mismatch { stored, computed } => {
            format!("mismatch (stored {stored}, computed {computed})")
        }
        HashCheck::NotChecked => "not checked".to_string(),
    }
}

fn signature_line(check: &SignatureCheck) -> String {
    match check {
        SignatureCheck::Verified => "verified",
        SignatureCheck::Mismatch => "mismatch",
        SignatureCheck::Unsigned => "unsigned",
        SignatureCheck::NotChecked => "not checked",
    }
    .to_string()
}

fn verdict_line(check: &VerdictCheck) -> String {
    match check {
        VerdictCheck::Consistent => "consistent".to_string(),
        VerdictCheck::Inconsistent { stored, derived } => {
            format!(
                "inconsistent (stored {}, derived {})",
                stored.as_str(),
                derived.as_str()
            )
        }
        VerdictCheck::NotChecked => "not checked".to_string(),
    }
}
