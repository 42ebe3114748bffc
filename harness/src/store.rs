//! Bundle directory persistence: write/read/verify a bundle to/from disk.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   proof_bundle.json       — manifest, canonical pretty JSON
//!   traces/login.json       — trace payload at its declared tracePath
//!   traces/logout.json      — ...one file per TraceRef
//! ```
//!
//! Trace file locations come from the manifest's `tracePath` declarations;
//! the directory path itself is never part of any hash surface.
//!
//! # Fail-closed semantics
//!
//! - Missing manifest → error
//! - Missing declared trace files → error
//! - Extra undeclared files → error
//! - Trace paths that escape the directory → error (write and read side)

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use proofgate_kernel::proof::canon::{CanonForm, EncodingError};
use proofgate_kernel::proof::model::ProofBundle;
use proofgate_kernel::proof::parse::{parse_bundle, BundleParseError};
use proofgate_kernel::proof::verify::{verify_bundle, VerifyOptions, VerifyReport};

/// Fixed manifest filename in the bundle directory.
pub const MANIFEST_FILENAME: &str = "proof_bundle.json";

/// A bundle together with the trace payloads it declares, keyed by trace id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBundle {
    pub bundle: ProofBundle,
    pub traces: BTreeMap<String, Vec<u8>>,
}

/// Error writing a bundle directory.
#[derive(Debug)]
pub enum BundleStoreError {
    /// I/O error during write.
    Io { detail: String },
    /// The manifest could not be canonicalized.
    Encoding(EncodingError),
    /// A declared trace has no payload to write.
    MissingTraceContent { trace_id: String },
    /// A payload was supplied for a trace the bundle does not declare.
    UnknownTraceContent { trace_id: String },
    /// Two declared traces share the same id.
    DuplicateTraceId { trace_id: String },
    /// A declared trace path cannot be written inside the directory.
    InvalidTracePath { trace_path: String, detail: String },
}

impl std::fmt::Display for BundleStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::Encoding(e) => write!(f, "canonical JSON error: {e}"),
            Self::MissingTraceContent { trace_id } => {
                write!(f, "no payload for declared trace: {trace_id}")
            }
            Self::UnknownTraceContent { trace_id } => {
                write!(f, "payload for undeclared trace: {trace_id}")
            }
            Self::DuplicateTraceId { trace_id } => {
                write!(f, "duplicate trace id: {trace_id}")
            }
            Self::InvalidTracePath { trace_path, detail } => {
                write!(f, "invalid trace path {trace_path}: {detail}")
            }
        }
    }
}

impl std::error::Error for BundleStoreError {}

impl From<EncodingError> for BundleStoreError {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}

/// Error reading a bundle directory.
#[derive(Debug)]
pub enum BundleLoadError {
    /// I/O error during read.
    Io { detail: String },
    /// `proof_bundle.json` does not exist.
    MissingManifest,
    /// The manifest failed schema validation.
    Parse(BundleParseError),
    /// A declared trace file is missing from the directory.
    MissingTrace { trace_id: String, trace_path: String },
    /// An undeclared file exists in the directory.
    ExtraFile { path: String },
}

impl std::fmt::Display for BundleLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingManifest => write!(f, "missing manifest file: {MANIFEST_FILENAME}"),
            Self::Parse(e) => write!(f, "manifest rejected: {e}"),
            Self::MissingTrace {
                trace_id,
                trace_path,
            } => {
                write!(f, "missing trace file for {trace_id}: {trace_path}")
            }
            Self::ExtraFile { path } => write!(f, "undeclared extra file: {path}"),
        }
    }
}

impl std::error::Error for BundleLoadError {}

impl From<BundleParseError> for BundleLoadError {
    fn from(e: BundleParseError) -> Self {
        Self::Parse(e)
    }
}

/// Error verifying a bundle directory.
#[derive(Debug)]
pub enum BundleDirVerifyError {
    /// Error loading the directory.
    Load(BundleLoadError),
    /// The manifest could not be re-canonicalized for hashing.
    Encoding(EncodingError),
}

impl std::fmt::Display for BundleDirVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(e) => write!(f, "load error: {e}"),
            Self::Encoding(e) => write!(f, "canonical JSON error: {e}"),
        }
    }
}

impl std::error::Error for BundleDirVerifyError {}

/// Write a bundle and its trace payloads to a directory.
///
/// Creates the directory if it does not exist. Trace files land first, the
/// manifest last, each through a temp-file-then-rename write, so a manifest
/// on disk always describes a complete directory.
///
/// # Errors
///
/// Returns [`BundleStoreError`] when a declared trace lacks a payload, a
/// payload lacks a declaration, a trace path escapes the directory, or an
/// I/O or canonicalization step fails.
pub fn write_bundle_dir(stored: &StoredBundle, dir: &Path) -> Result<(), BundleStoreError> {
    validate_layout(stored)?;

    let manifest = stored.bundle.to_canonical_bytes(CanonForm::Pretty)?;

    std::fs::create_dir_all(dir).map_err(|e| BundleStoreError::Io {
        detail: format!("create_dir_all: {e}"),
    })?;

    for trace_ref in &stored.bundle.traces {
        let Some(content) = stored.traces.get(&trace_ref.trace_id) else {
            return Err(BundleStoreError::MissingTraceContent {
                trace_id: trace_ref.trace_id.clone(),
            });
        };
        let path = dir.join(&trace_ref.trace_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BundleStoreError::Io {
                detail: format!("create_dir_all {}: {e}", parent.display()),
            })?;
        }
        write_atomic(&path, content)?;
    }

    write_atomic(&dir.join(MANIFEST_FILENAME), &manifest)?;

    Ok(())
}

/// Read a bundle directory back into a [`StoredBundle`].
///
/// Fail-closed: the manifest must parse, every declared trace file must
/// exist, and no undeclared file may exist.
///
/// # Errors
///
/// Returns [`BundleLoadError`] on any validation failure.
pub fn read_bundle_dir(dir: &Path) -> Result<StoredBundle, BundleLoadError> {
    let manifest_bytes = match std::fs::read(dir.join(MANIFEST_FILENAME)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BundleLoadError::MissingManifest);
        }
        Err(e) => {
            return Err(BundleLoadError::Io {
                detail: format!("read {MANIFEST_FILENAME}: {e}"),
            });
        }
    };

    let bundle = parse_bundle(&manifest_bytes)?;

    let mut traces = BTreeMap::new();
    let mut declared: BTreeSet<PathBuf> = BTreeSet::new();
    declared.insert(PathBuf::from(MANIFEST_FILENAME));

    for trace_ref in &bundle.traces {
        let content = std::fs::read(dir.join(&trace_ref.trace_path)).map_err(|_| {
            BundleLoadError::MissingTrace {
                trace_id: trace_ref.trace_id.clone(),
                trace_path: trace_ref.trace_path.clone(),
            }
        })?;
        declared.insert(PathBuf::from(&trace_ref.trace_path));
        traces.insert(trace_ref.trace_id.clone(), content);
    }

    for path in list_files(dir)? {
        if !declared.contains(&path) {
            return Err(BundleLoadError::ExtraFile {
                path: path.display().to_string(),
            });
        }
    }

    Ok(StoredBundle { bundle, traces })
}

/// Verify a bundle directory: load fail-closed, then run the kernel's
/// verification over the manifest. This is the offline verification
/// entrypoint for bundles at rest.
///
/// # Errors
///
/// Returns [`BundleDirVerifyError`] when the directory cannot be loaded;
/// integrity findings come back inside the [`VerifyReport`].
pub fn verify_bundle_dir(
    dir: &Path,
    options: &VerifyOptions,
) -> Result<VerifyReport, BundleDirVerifyError> {
    let stored = read_bundle_dir(dir).map_err(BundleDirVerifyError::Load)?;
    verify_bundle(&stored.bundle, options).map_err(BundleDirVerifyError::Encoding)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Cross-check declared traces against supplied payloads before touching
/// the filesystem.
fn validate_layout(stored: &StoredBundle) -> Result<(), BundleStoreError> {
    let mut ids: BTreeSet<&str> = BTreeSet::new();
    let mut paths: BTreeSet<&str> = BTreeSet::new();

    for trace_ref in &stored.bundle.traces {
        if !ids.insert(trace_ref.trace_id.as_str()) {
            return Err(BundleStoreError::DuplicateTraceId {
                trace_id: trace_ref.trace_id.clone(),
            });
        }
        check_trace_path(&trace_ref.trace_path)?;
        if !paths.insert(trace_ref.trace_path.as_str()) {
            return Err(BundleStoreError::InvalidTracePath {
                trace_path: trace_ref.trace_path.clone(),
                detail: "declared twice".into(),
            });
        }
        if !stored.traces.contains_key(&trace_ref.trace_id) {
            return Err(BundleStoreError::MissingTraceContent {
                trace_id: trace_ref.trace_id.clone(),
            });
        }
    }

    for trace_id in stored.traces.keys() {
        if !ids.contains(trace_id.as_str()) {
            return Err(BundleStoreError::UnknownTraceContent {
                trace_id: trace_id.clone(),
            });
        }
    }

    Ok(())
}

fn check_trace_path(raw: &str) -> Result<(), BundleStoreError> {
    let invalid = |detail: &str| BundleStoreError::InvalidTracePath {
        trace_path: raw.to_string(),
        detail: detail.into(),
    };
    if raw.is_empty() {
        return Err(invalid("empty"));
    }
    if raw == MANIFEST_FILENAME {
        return Err(invalid("collides with the manifest"));
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(invalid("absolute"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(invalid("parent-directory component"));
    }
    Ok(())
}

/// Write bytes to a path via temp file + rename (best-effort atomicity on Unix).
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), BundleStoreError> {
    let dir = path.parent().ok_or_else(|| BundleStoreError::Io {
        detail: "no parent directory".into(),
    })?;

    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dir.join(temp_name);

    std::fs::write(&temp_path, content).map_err(|e| BundleStoreError::Io {
        detail: format!("write {}: {e}", temp_path.display()),
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| BundleStoreError::Io {
        detail: format!("rename {} → {}: {e}", temp_path.display(), path.display()),
    })?;

    Ok(())
}

/// List all regular files under the directory as relative paths, skipping
/// leftover `.tmp_` files.
fn list_files(root: &Path) -> Result<BTreeSet<PathBuf>, BundleLoadError> {
    let mut files = BTreeSet::new();
    collect_files(root, Path::new(""), &mut files)?;
    Ok(files)
}

fn collect_files(
    dir: &Path,
    prefix: &Path,
    out: &mut BTreeSet<PathBuf>,
) -> Result<(), BundleLoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| BundleLoadError::Io {
        detail: format!("read_dir: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| BundleLoadError::Io {
            detail: format!("dir entry: {e}"),
        })?;

        let file_type = entry.file_type().map_err(|e| BundleLoadError::Io {
            detail: format!("file_type: {e}"),
        })?;

        if let Some(name) = entry.file_name().to_str() {
            let rel = prefix.join(name);
            if file_type.is_dir() {
                collect_files(&entry.path(), &rel, out)?;
            } else if file_type.is_file() && !name.starts_with(".tmp_") {
                out.insert(rel);
            }
        }
    }

    Ok(())
}
