//! Manifests for generated test files.
//!
//! Every `login.spec.ts` is written next to `login.spec.ts.manifest.json`,
//! which records the blake3 hash of the file and how it was produced.
//! `verify` recomputes the hash so hand edits to generated tests are
//! caught before they drift from the plan they came from.

use crate::error::{GenError, GenResult};
use crate::hir::GenerationMetadata;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const SIDECAR_SUFFIX: &str = ".manifest.json";

/// Sidecar record for one generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    /// Manifest layout version
    pub format: u32,
    /// File name of the generated file, relative to the manifest
    pub file: String,
    /// Hex blake3 digest of the generated contents
    pub blake3: String,
    /// Tool, version, input hash and regenerate command
    pub generation: GenerationMetadata,
}

impl FileManifest {
    /// Layout version written by this crate
    pub const FORMAT: u32 = 1;

    /// Manifest in the current layout
    #[must_use]
    pub fn new(file: impl Into<String>, blake3: impl Into<String>, generation: GenerationMetadata) -> Self {
        Self {
            format: Self::FORMAT,
            file: file.into(),
            blake3: blake3.into(),
            generation,
        }
    }

    /// `dir/login.spec.ts` maps to `dir/login.spec.ts.manifest.json`.
    #[must_use]
    pub fn sidecar_path(generated: &Path) -> PathBuf {
        let mut name = file_name(generated);
        name.push_str(SIDECAR_SUFFIX);
        generated.with_file_name(name)
    }

    fn load(path: &Path) -> GenResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn store(&self, path: &Path) -> GenResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Hex blake3 digest of `contents`.
#[must_use]
pub fn content_hash(contents: &str) -> String {
    blake3::hash(contents.as_bytes()).to_hex().to_string()
}

/// Check a generated file against its sidecar manifest.
///
/// Fails with `ManifestError` when the sidecar is missing or malformed and
/// with `HashMismatch` when the file changed after generation.
pub fn verify(generated: &Path) -> GenResult<FileManifest> {
    let sidecar = FileManifest::sidecar_path(generated);
    let manifest = FileManifest::load(&sidecar).map_err(|e| GenError::ManifestError {
        path: generated.display().to_string(),
        reason: format!("cannot read {}: {e}", sidecar.display()),
    })?;

    let actual = content_hash(&fs::read_to_string(generated)?);
    if actual != manifest.blake3 {
        return Err(GenError::HashMismatch {
            path: generated.display().to_string(),
            expected: manifest.blake3,
            actual,
        });
    }

    debug!(path = %generated.display(), hash = %actual, "manifest verified");
    Ok(manifest)
}

/// Write `contents` to `path` and its manifest beside it; returns the
/// manifest path.
pub fn write_with_manifest(path: &Path, contents: &str, metadata: GenerationMetadata) -> GenResult<PathBuf> {
    fs::write(path, contents)?;

    let sidecar = FileManifest::sidecar_path(path);
    FileManifest::new(file_name(path), content_hash(contents), metadata).store(&sidecar)?;
    debug!(path = %path.display(), manifest = %sidecar.display(), "wrote generated file");

    Ok(sidecar)
}
