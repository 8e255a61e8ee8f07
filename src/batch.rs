//! Running a pipeline over many files.
//!
//! Inputs are discovered with [walkdir](https://docs.rs/walkdir) and processed
//! in parallel with [rayon](https://docs.rs/rayon). One file failing does not
//! stop the others; every file gets a [`FileReport`]. All files share one
//! [`CancelToken`], so a deadline or cancellation stops the whole batch.
//!
//! ```text
//! photos/dawn.jpg ──▶ load ──▶ pipeline.run ──▶ save variants ──▶ dawn.manifest.json
//! photos/dusk.png ──▶ ...                                          (in parallel)
//! ```

use crate::export::{ExportError, save_variants, write_manifest};
use crate::imaging::{BackendError, EncodeFormat, ImageBackend, is_supported_input, load_image};
use crate::pipeline::{CancelToken, Pipeline, PipelineError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot read input {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("No supported images found in the given inputs")]
    NoInputs,
}

/// Why a single file failed.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to load: {0}")]
    Load(#[from] BackendError),
    #[error("Pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Failed to save: {0}")]
    Export(#[from] ExportError),
}

impl FileError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileError::Pipeline(e) if e.is_cancelled())
    }
}

/// What was written for one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFile {
    pub manifest: PathBuf,
    pub variants: usize,
}

#[derive(Debug)]
pub struct FileReport {
    pub source: PathBuf,
    pub outcome: Result<SavedFile, FileError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&Path, &SavedFile)> {
        self.files
            .iter()
            .filter_map(|f| f.outcome.as_ref().ok().map(|s| (f.source.as_path(), s)))
    }

    /// Failures other than cancellation.
    pub fn failed(&self) -> impl Iterator<Item = (&Path, &FileError)> {
        self.files.iter().filter_map(|f| match &f.outcome {
            Err(e) if !e.is_cancelled() => Some((f.source.as_path(), e)),
            _ => None,
        })
    }

    pub fn cancelled_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(&f.outcome, Err(e) if e.is_cancelled()))
            .count()
    }

    pub fn variant_count(&self) -> usize {
        self.succeeded().map(|(_, s)| s.variants).sum()
    }

    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| f.outcome.is_ok())
    }
}

/// Expand files and directories into a sorted, de-duplicated list of images.
///
/// Directories are walked recursively; hidden entries are skipped. Files
/// with unsupported extensions are skipped with a warning when named
/// explicitly and silently when found by walking.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let mut inputs = Vec::new();

    for root in paths {
        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

        for entry in walker {
            let entry = entry.map_err(|source| BatchError::Walk {
                path: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if is_supported_input(entry.path()) {
                inputs.push(entry.into_path());
            } else if entry.depth() == 0 {
                tracing::warn!(path = %entry.path().display(), "skipping unsupported file");
            }
        }
    }

    inputs.sort();
    inputs.dedup();
    if inputs.is_empty() {
        return Err(BatchError::NoInputs);
    }
    Ok(inputs)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Load one file, run the pipeline on it and save every variant.
pub fn process_file(
    pipeline: &Pipeline,
    backend: &dyn ImageBackend,
    source: &Path,
    output_dir: &Path,
    format: EncodeFormat,
    cancel: &CancelToken,
) -> Result<SavedFile, FileError> {
    let image = load_image(source)?;
    let result = pipeline.run(cancel, image)?;
    let manifest = save_variants(backend, &result, source, output_dir, format)?;
    let manifest_path = write_manifest(&manifest, output_dir)?;
    Ok(SavedFile {
        manifest: manifest_path,
        variants: manifest.variants.len(),
    })
}

/// Process every input in parallel on the current rayon pool.
///
/// Reports come back in input order.
pub fn process_all(
    pipeline: &Pipeline,
    backend: &dyn ImageBackend,
    inputs: &[PathBuf],
    output_dir: &Path,
    format: EncodeFormat,
    cancel: &CancelToken,
) -> BatchReport {
    tracing::info!(
        files = inputs.len(),
        stages = pipeline.len(),
        output = %output_dir.display(),
        "processing batch"
    );

    let files = inputs
        .par_iter()
        .map(|source| {
            let outcome = process_file(pipeline, backend, source, output_dir, format, cancel);
            match &outcome {
                Ok(saved) => tracing::info!(
                    source = %source.display(),
                    variants = saved.variants,
                    "processed"
                ),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(source = %source.display(), "cancelled")
                }
                Err(e) => tracing::error!(source = %source.display(), error = %e, "failed"),
            }
            FileReport {
                source: source.clone(),
                outcome,
            }
        })
        .collect();

    BatchReport { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Dimensions, Quality, RustBackend};
    use crate::stages::{Compression, Compressor, Resizer};
    use crate::test_helpers::sample_image;
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        sample_image(width, height).save(path).unwrap();
    }

    fn pipeline() -> Pipeline {
        Pipeline::builder()
            .then(Resizer::new(vec![Dimensions::width(16)]))
            .then(Compressor::new(Compression::jpeg(Quality::new(70))))
    }

    #[test]
    fn collect_walks_directories_sorted() {
        let tmp = TempDir::new().unwrap();
        write_png(&tmp.path().join("b.png"), 4, 4);
        write_png(&tmp.path().join("nested/a.png"), 4, 4);
        write_png(&tmp.path().join(".hidden/c.png"), 4, 4);
        fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();

        let inputs = collect_inputs(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(
            inputs,
            vec![tmp.path().join("b.png"), tmp.path().join("nested/a.png")]
        );
    }

    #[test]
    fn collect_deduplicates_overlapping_inputs() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        write_png(&file, 4, 4);

        let inputs = collect_inputs(&[tmp.path().to_path_buf(), file.clone()]).unwrap();
        assert_eq!(inputs, vec![file]);
    }

    #[test]
    fn collect_missing_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = collect_inputs(&[tmp.path().join("missing")]).unwrap_err();
        assert!(matches!(err, BatchError::Walk { .. }));
    }

    #[test]
    fn collect_nothing_supported_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        let err = collect_inputs(&[tmp.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, BatchError::NoInputs));
    }

    #[test]
    fn process_file_writes_variants_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("in/dawn.png");
        write_png(&source, 40, 30);
        let out = tmp.path().join("out");

        let saved = process_file(
            &pipeline(),
            &RustBackend::new(),
            &source,
            &out,
            EncodeFormat::Png,
            &CancelToken::new(),
        )
        .unwrap();

        // original + one resized variant
        assert_eq!(saved.variants, 2);
        assert_eq!(saved.manifest, out.join("dawn.manifest.json"));
        assert!(saved.manifest.exists());
        let written = fs::read_dir(&out).unwrap().count();
        assert_eq!(written, 3);
    }

    #[test]
    fn process_all_reports_each_file_in_order() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("a.png");
        let bad = tmp.path().join("b.png");
        write_png(&good, 20, 20);
        fs::write(&bad, b"definitely not a png").unwrap();

        let report = process_all(
            &pipeline(),
            &RustBackend::new(),
            &[good.clone(), bad.clone()],
            &tmp.path().join("out"),
            EncodeFormat::Png,
            &CancelToken::new(),
        );

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].source, good);
        assert_eq!(report.files[1].source, bad);
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.variant_count(), 2);
        assert!(!report.is_success());
        assert!(matches!(report.files[1].outcome, Err(FileError::Load(_))));
    }

    #[test]
    fn cancelled_batch_marks_files_cancelled() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.png");
        write_png(&source, 20, 20);
        let token = CancelToken::new();
        token.cancel();

        let report = process_all(
            &pipeline(),
            &RustBackend::new(),
            &[source],
            &tmp.path().join("out"),
            EncodeFormat::Png,
            &token,
        );

        assert_eq!(report.cancelled_count(), 1);
        assert_eq!(report.failed().count(), 0);
        assert!(!report.is_success());
    }
}
