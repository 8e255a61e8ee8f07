//! Writing pipeline results to disk.
//!
//! Every variant of a [`PipelineResult`] is encoded and saved as
//! `<stem>-<id>.<ext>`, and a `<stem>.manifest.json` records which file
//! carries which tags:
//!
//! ```text
//! out/
//! ├── dawn-3f9a1c0b52de.jpg      # original
//! ├── dawn-a81e44f09c17.jpg      # resized, size=sm, compressed, ...
//! ├── ...
//! └── dawn.manifest.json
//! ```
//!
//! ## Variant IDs
//!
//! The id is the first 12 hex digits of a SHA-256 over the input stem, the
//! variant's position in the result, its dimensions and its tags. It is
//! stable across runs with the same configuration, so re-running a build
//! overwrites the same files instead of accumulating new ones.

use crate::imaging::{BackendError, EncodeFormat, ImageBackend};
use crate::pipeline::{PipelineResult, Processed};
use crate::tags::Tags;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ID_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Encoding failed: {0}")]
    Encode(#[from] BackendError),
}

/// One saved file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedVariant {
    pub id: String,
    /// File name relative to the output directory.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub original: bool,
    pub tags: Tags,
}

/// Everything saved for one input image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantManifest {
    pub source: String,
    pub variants: Vec<SavedVariant>,
}

impl VariantManifest {
    pub fn original(&self) -> Option<&SavedVariant> {
        self.variants.iter().find(|v| v.original)
    }
}

/// Deterministic opaque id for the variant at `position`.
pub fn variant_id(stem: &str, position: usize, variant: &Processed) -> String {
    let (width, height) = variant.dimensions();
    let mut hasher = Sha256::new();
    hasher.update(stem.as_bytes());
    hasher.update((position as u64).to_le_bytes());
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    for tag in &variant.tags {
        hasher.update([0u8]);
        hasher.update(tag.as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..ID_LEN].to_string()
}

/// Encode and write every variant of `result` into `output_dir`.
pub fn save_variants(
    backend: &dyn ImageBackend,
    result: &PipelineResult,
    source: &Path,
    output_dir: &Path,
    format: EncodeFormat,
) -> Result<VariantManifest, ExportError> {
    std::fs::create_dir_all(output_dir)?;
    let stem = file_stem(source);

    let variants = result
        .images
        .iter()
        .enumerate()
        .map(|(position, variant)| {
            let id = variant_id(&stem, position, variant);
            let file = format!("{stem}-{id}.{}", format.extension());
            let bytes = backend.encode(&variant.image, format)?;
            std::fs::write(output_dir.join(&file), bytes)?;
            tracing::trace!(file = %file, tags = %variant.tags, "saved variant");

            let (width, height) = variant.dimensions();
            Ok(SavedVariant {
                id,
                file,
                width,
                height,
                original: variant.original,
                tags: variant.tags.clone(),
            })
        })
        .collect::<Result<Vec<_>, ExportError>>()?;

    Ok(VariantManifest {
        source: source.display().to_string(),
        variants,
    })
}

/// Write `<stem>.manifest.json` next to the variants and return its path.
pub fn write_manifest(
    manifest: &VariantManifest,
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let path = output_dir.join(format!(
        "{}.manifest.json",
        file_stem(Path::new(&manifest.source))
    ));
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}
