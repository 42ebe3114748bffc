//! Bundle parsing: fail-closed deserialization with structural validation.
//!
//! The schema version is checked before anything else; a version this code
//! does not recognize aborts the parse entirely, with no best-effort
//! interpretation and no partial bundle. Every structural violation names
//! the offending field path (`claims[2].status` style). Unknown fields are
//! rejected everywhere except inside the opaque detail payloads, so a
//! re-serialized bundle always covers exactly the bytes that were hashed.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use serde_json::{Map, Value};

use crate::proof::digest::Hex64;
use crate::proof::model::{
    BundleVerdict, Claim, ClaimStatus, Evidence, EvidenceKind, ProofBundle, SpecInfo, TraceRef,
    VerdictArtifact, SCHEMA_VERSION,
};

/// Error parsing a serialized bundle. All variants are fatal to the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleParseError {
    /// The input is not valid JSON.
    Syntax { detail: String },
    /// The manifest declares a schema version this code does not recognize.
    UnsupportedSchemaVersion { found: String },
    /// The manifest is structurally malformed at the named field.
    SchemaValidation { path: String, reason: String },
}

impl std::fmt::Display for BundleParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { detail } => write!(f, "invalid JSON: {detail}"),
            Self::UnsupportedSchemaVersion { found } => {
                write!(f, "unsupported schema version: {found:?}")
            }
            Self::SchemaValidation { path, reason } => {
                write!(f, "schema validation failed at {path}: {reason}")
            }
        }
    }
}

impl std::error::Error for BundleParseError {}

/// Parse and structurally validate a serialized bundle.
///
/// # Errors
///
/// - [`BundleParseError::Syntax`] for malformed JSON.
/// - [`BundleParseError::UnsupportedSchemaVersion`] for any schema version
///   other than [`SCHEMA_VERSION`]; checked before all field validation.
/// - [`BundleParseError::SchemaValidation`] for missing/mistyped fields,
///   unrecognized enum values, out-of-range confidence, non-relative trace
///   paths, malformed digests, duplicate claim ids, and unknown fields.
pub fn parse_bundle(bytes: &[u8]) -> Result<ProofBundle, BundleParseError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| BundleParseError::Syntax {
        detail: e.to_string(),
    })?;

    let obj = value
        .as_object()
        .ok_or_else(|| schema("$", "bundle must be a JSON object"))?;

    // Version gate first: nothing else is interpreted for a version we do
    // not understand.
    let version = require_str(obj, "", "schemaVersion")?;
    if version != SCHEMA_VERSION {
        return Err(BundleParseError::UnsupportedSchemaVersion {
            found: version.to_string(),
        });
    }

    reject_unknown_keys(
        obj,
        "",
        &[
            "claims",
            "contentHash",
            "createdAt",
            "evidence",
            "phaseVerdicts",
            "schemaVersion",
            "signature",
            "spec",
            "traces",
            "verdict",
            "verdictReason",
        ],
    )?;

    let content_hash = require_hex64(obj, "", "contentHash")?;

    let created_at = require_str(obj, "", "createdAt")?;
    if created_at.trim().is_empty() {
        return Err(schema("createdAt", "must be a non-blank timestamp"));
    }

    let spec = parse_spec_info(require(obj, "", "spec")?, "spec")?;
    let phase_verdicts = parse_each(obj, "phaseVerdicts", parse_phase_verdict)?;
    let claims = parse_each(obj, "claims", parse_claim)?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (i, claim) in claims.iter().enumerate() {
        if !seen.insert(claim.id.as_str()) {
            return Err(schema(
                &format!("claims[{i}].id"),
                format!("duplicate claim id '{}'", claim.id),
            ));
        }
    }

    let traces = parse_each(obj, "traces", parse_trace_ref)?;
    let evidence = parse_each(obj, "evidence", parse_evidence)?;

    let verdict_str = require_str(obj, "", "verdict")?;
    let verdict = BundleVerdict::parse(verdict_str)
        .ok_or_else(|| schema("verdict", format!("unrecognized bundle verdict '{verdict_str}'")))?;
    let verdict_reason = require_str(obj, "", "verdictReason")?.to_string();

    let signature = match obj.get("signature") {
        None => None,
        Some(v) => {
            let raw = v
                .as_str()
                .ok_or_else(|| schema("signature", "must be a string"))?;
            Some(
                Hex64::parse(raw)
                    .ok_or_else(|| schema("signature", "must be 64 lowercase hex characters"))?,
            )
        }
    };

    Ok(ProofBundle {
        schema_version: version.to_string(),
        content_hash,
        spec,
        phase_verdicts,
        claims,
        traces,
        evidence,
        verdict,
        verdict_reason,
        created_at: created_at.to_string(),
        signature,
    })
}

// ---------------------------------------------------------------------------
// Per-record parsers
// ---------------------------------------------------------------------------

fn parse_spec_info(value: &Value, path: &str) -> Result<SpecInfo, BundleParseError> {
    let obj = as_object(value, path)?;
    reject_unknown_keys(obj, path, &["domain", "specHash", "specPath", "version"])?;

    let spec_path = optional_str(obj, path, "specPath")?;
    if let Some(p) = &spec_path {
        if Path::new(p).is_absolute() {
            return Err(schema(&join(path, "specPath"), "must be a relative path"));
        }
    }

    Ok(SpecInfo {
        domain: require_str(obj, path, "domain")?.to_string(),
        version: require_str(obj, path, "version")?.to_string(),
        spec_hash: require_hex64(obj, path, "specHash")?,
        spec_path,
    })
}

fn parse_phase_verdict(value: &Value, path: &str) -> Result<VerdictArtifact, BundleParseError> {
    let obj = as_object(value, path)?;
    reject_unknown_keys(obj, path, &["details", "phase", "score", "timestamp", "verdict"])?;

    let details = require(obj, path, "details")?
        .as_object()
        .cloned()
        .ok_or_else(|| schema(&join(path, "details"), "must be an object"))?;

    let score = match obj.get("score") {
        None => None,
        // A non-finite score canonicalizes to null; read it back as absent.
        Some(Value::Null) => None,
        Some(v) => Some(
            v.as_f64()
                .ok_or_else(|| schema(&join(path, "score"), "must be a number"))?,
        ),
    };

    Ok(VerdictArtifact {
        phase: require_str(obj, path, "phase")?.to_string(),
        verdict: require_str(obj, path, "verdict")?.to_string(),
        score,
        details,
        timestamp: require_str(obj, path, "timestamp")?.to_string(),
    })
}

fn parse_claim(value: &Value, path: &str) -> Result<Claim, BundleParseError> {
    let obj = as_object(value, path)?;
    reject_unknown_keys(
        obj,
        path,
        &[
            "behavior",
            "id",
            "kind",
            "reason",
            "sourceLocation",
            "status",
            "traceIds",
        ],
    )?;

    let status_str = require_str(obj, path, "status")?;
    let status = ClaimStatus::parse(status_str).ok_or_else(|| {
        schema(
            &join(path, "status"),
            format!("unrecognized claim status '{status_str}'"),
        )
    })?;

    let trace_ids = match obj.get("traceIds") {
        None => None,
        Some(v) => {
            let arr = v
                .as_array()
                .ok_or_else(|| schema(&join(path, "traceIds"), "must be an array"))?;
            let mut ids = Vec::with_capacity(arr.len());
            for (i, item) in arr.iter().enumerate() {
                let id = item.as_str().ok_or_else(|| {
                    schema(&format!("{}[{i}]", join(path, "traceIds")), "must be a string")
                })?;
                ids.push(id.to_string());
            }
            Some(ids)
        }
    };

    Ok(Claim {
        id: require_str(obj, path, "id")?.to_string(),
        kind: require_str(obj, path, "kind")?.to_string(),
        behavior: optional_str(obj, path, "behavior")?,
        status,
        reason: optional_str(obj, path, "reason")?,
        trace_ids,
        source_location: optional_str(obj, path, "sourceLocation")?,
    })
}

fn parse_trace_ref(value: &Value, path: &str) -> Result<TraceRef, BundleParseError> {
    let obj = as_object(value, path)?;
    reject_unknown_keys(
        obj,
        path,
        &["behavior", "eventCount", "test", "traceId", "tracePath"],
    )?;

    let trace_path = require_str(obj, path, "tracePath")?;
    validate_trace_path(trace_path, &join(path, "tracePath"))?;

    let event_count = require(obj, path, "eventCount")?
        .as_u64()
        .ok_or_else(|| schema(&join(path, "eventCount"), "must be a non-negative integer"))?;

    Ok(TraceRef {
        trace_id: require_str(obj, path, "traceId")?.to_string(),
        behavior: require_str(obj, path, "behavior")?.to_string(),
        test: require_str(obj, path, "test")?.to_string(),
        trace_path: trace_path.to_string(),
        event_count,
    })
}

fn parse_evidence(value: &Value, path: &str) -> Result<Evidence, BundleParseError> {
    let obj = as_object(value, path)?;
    reject_unknown_keys(
        obj,
        path,
        &["claimId", "confidence", "detail", "kind", "satisfied"],
    )?;

    let kind_str = require_str(obj, path, "kind")?;
    let kind = EvidenceKind::parse(kind_str).ok_or_else(|| {
        schema(
            &join(path, "kind"),
            format!("unrecognized evidence kind '{kind_str}'"),
        )
    })?;

    let confidence = require(obj, path, "confidence")?
        .as_f64()
        .ok_or_else(|| schema(&join(path, "confidence"), "must be a number"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(schema(&join(path, "confidence"), "must be within [0,1]"));
    }

    let satisfied = require(obj, path, "satisfied")?
        .as_bool()
        .ok_or_else(|| schema(&join(path, "satisfied"), "must be a boolean"))?;

    Ok(Evidence {
        claim_id: require_str(obj, path, "claimId")?.to_string(),
        kind,
        satisfied,
        confidence,
        detail: require(obj, path, "detail")?.clone(),
    })
}

/// Trace paths stay inside the bundle directory: relative, no `..`.
fn validate_trace_path(raw: &str, path: &str) -> Result<(), BundleParseError> {
    if raw.is_empty() {
        return Err(schema(path, "must not be empty"));
    }
    let p = Path::new(raw);
    if p.is_absolute() {
        return Err(schema(path, "must be relative to the bundle root"));
    }
    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(schema(path, "must not contain parent-directory components"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Field extraction helpers
// ---------------------------------------------------------------------------

fn schema(path: &str, reason: impl Into<String>) -> BundleParseError {
    BundleParseError::SchemaValidation {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, BundleParseError> {
    value
        .as_object()
        .ok_or_else(|| schema(path, "must be an object"))
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<&'a Value, BundleParseError> {
    obj.get(key)
        .ok_or_else(|| schema(&join(parent, key), "required field is missing"))
}

fn require_str<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<&'a str, BundleParseError> {
    require(obj, parent, key)?
        .as_str()
        .ok_or_else(|| schema(&join(parent, key), "must be a string"))
}

fn require_hex64(
    obj: &Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<Hex64, BundleParseError> {
    let raw = require_str(obj, parent, key)?;
    Hex64::parse(raw)
        .ok_or_else(|| schema(&join(parent, key), "must be 64 lowercase hex characters"))
}

fn optional_str(
    obj: &Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<Option<String>, BundleParseError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| schema(&join(parent, key), "must be a string")),
    }
}

fn parse_each<T>(
    obj: &Map<String, Value>,
    key: &str,
    item_parser: impl Fn(&Value, &str) -> Result<T, BundleParseError>,
) -> Result<Vec<T>, BundleParseError> {
    let arr = require(obj, "", key)?
        .as_array()
        .ok_or_else(|| schema(key, "must be an array"))?;
    arr.iter()
        .enumerate()
        .map(|(i, item)| item_parser(item, &format!("{key}[{i}]")))
        .collect()
}

fn reject_unknown_keys(
    obj: &Map<String, Value>,
    parent: &str,
    allowed: &[&str],
) -> Result<(), BundleParseError> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(schema(&join(parent, key), "unrecognized field"));
        }
    }
    Ok(())
}
