//! Canonical JSON bytes: the single serialization implementation for hashing
//! and storage.
//!
//! **Exactly one place** produces canonical JSON bytes in the kernel. All
//! hashing and persistence flows must route through this module.
//!
//! # Canonicalization rules
//!
//! 1. Object keys are sorted lexicographically (byte order) at every depth.
//! 2. Compact form emits no insignificant whitespace (`{"a":1,"b":2}`).
//!    Pretty form indents with two spaces and ends with a single trailing
//!    newline.
//! 3. Strings are JSON-escaped per RFC 8259 §7. Line-ending sequences
//!    (`\r\n`, lone `\r`) inside string values are normalized to `\n` before
//!    escaping. Object keys are escaped but not normalized, so two distinct
//!    keys can never collapse into one.
//! 4. Numbers are written in `serde_json`'s shortest round-trip form (itoa
//!    for integers, ryu for floats), which is platform-independent. A
//!    non-finite `f64` cannot exist inside a `serde_json::Value`; every
//!    `f64 -> Value` boundary in the model maps NaN and ±infinity to `null`.
//! 5. `null`, `true`, `false` are written literally.
//! 6. Nesting deeper than [`MAX_DEPTH`] is rejected with
//!    [`EncodingError::TooDeep`] instead of recursing unboundedly.
//! 7. Output is always valid UTF-8.

use std::io::Write;

/// Maximum object/array nesting depth the encoder will follow.
pub const MAX_DEPTH: usize = 128;

/// Output form for canonical bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonForm {
    /// No insignificant whitespace. The hashing form.
    Compact,
    /// Two-space indentation, trailing newline. The storage form.
    Pretty,
}

/// Error type for canonical JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Value nesting exceeded [`MAX_DEPTH`] levels.
    TooDeep { limit: usize },
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooDeep { limit } => {
                write!(f, "value nesting exceeds {limit} levels")
            }
        }
    }
}

impl std::error::Error for EncodingError {}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// This is the single canonical JSON implementation in the kernel.
/// All hashing and storage flows that involve JSON must use this function.
///
/// # Errors
///
/// Returns [`EncodingError::TooDeep`] if the value nests more than
/// [`MAX_DEPTH`] levels of arrays/objects.
pub fn canonical_json_bytes(
    value: &serde_json::Value,
    form: CanonForm,
) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    match form {
        CanonForm::Compact => write_value(&mut buf, value, 0)?,
        CanonForm::Pretty => {
            write_value_pretty(&mut buf, value, 0)?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

/// Normalize line endings: `\r\n` and lone `\r` become `\n`.
///
/// Applied to string values during canonical encoding and to specification
/// text before hashing, so content hashes do not depend on the line-ending
/// convention of the machine that produced the text.
#[must_use]
pub fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn write_value(
    buf: &mut Vec<u8>,
    value: &serde_json::Value,
    depth: usize,
) -> Result<(), EncodingError> {
    if depth > MAX_DEPTH {
        return Err(EncodingError::TooDeep { limit: MAX_DEPTH });
    }
    match value {
        serde_json::Value::Null => {
            buf.extend_from_slice(b"null");
        }
        serde_json::Value::Bool(b) => {
            if *b {
                buf.extend_from_slice(b"true");
            } else {
                buf.extend_from_slice(b"false");
            }
        }
        serde_json::Value::Number(n) => {
            write_number(buf, n);
        }
        serde_json::Value::String(s) => {
            write_string_value(buf, s);
        }
        serde_json::Value::Array(arr) => {
            buf.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item, depth + 1)?;
            }
            buf.push(b']');
        }
        serde_json::Value::Object(map) => {
            // Sorted keys (lexicographic byte order).
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            buf.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_key(buf, key);
                buf.push(b':');
                write_value(buf, &map[*key], depth + 1)?;
            }
            buf.push(b'}');
        }
    }
    Ok(())
}

fn write_value_pretty(
    buf: &mut Vec<u8>,
    value: &serde_json::Value,
    depth: usize,
) -> Result<(), EncodingError> {
    if depth > MAX_DEPTH {
        return Err(EncodingError::TooDeep { limit: MAX_DEPTH });
    }
    match value {
        serde_json::Value::Array(arr) if !arr.is_empty() => {
            buf.extend_from_slice(b"[\n");
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    buf.extend_from_slice(b",\n");
                }
                write_indent(buf, depth + 1);
                write_value_pretty(buf, item, depth + 1)?;
            }
            buf.push(b'\n');
            write_indent(buf, depth);
            buf.push(b']');
        }
        serde_json::Value::Object(map) if !map.is_empty() => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            buf.extend_from_slice(b"{\n");
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.extend_from_slice(b",\n");
                }
                write_indent(buf, depth + 1);
                write_key(buf, key);
                buf.extend_from_slice(b": ");
                write_value_pretty(buf, &map[*key], depth + 1)?;
            }
            buf.push(b'\n');
            write_indent(buf, depth);
            buf.push(b'}');
        }
        // Scalars, empty arrays, empty objects: same as compact.
        other => write_value(buf, other, depth)?,
    }
    Ok(())
}

fn write_indent(buf: &mut Vec<u8>, depth: usize) {
    for _ in 0..depth {
        buf.extend_from_slice(b"  ");
    }
}

fn write_number(buf: &mut Vec<u8>, n: &serde_json::Number) {
    // serde_json renders integers via itoa and finite floats via ryu
    // (shortest round-trip form), identical on every platform.
    let _ = write!(buf, "{n}");
}

fn write_key(buf: &mut Vec<u8>, key: &str) {
    write_escaped(buf, key);
}

fn write_string_value(buf: &mut Vec<u8>, s: &str) {
    if s.contains('\r') {
        write_escaped(buf, &normalize_line_endings(s));
    } else {
        write_escaped(buf, s);
    }
}

fn write_escaped(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            // Control characters U+0000..U+001F (except those handled above).
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => {
                let mut utf8_buf = [0u8; 4];
                let encoded = c.encode_utf8(&mut utf8_buf);
                buf.extend_from_slice(encoded.as_bytes());
            }
        }
    }
    buf.push(b'"');
}
