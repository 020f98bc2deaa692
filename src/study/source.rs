//! Study byte-buffer sources.
//!
//! A [`StudySource`] hands the pipeline a complete in-memory buffer for a
//! study identifier. The trait keeps the registry independent of where the
//! bytes come from; the filesystem source below is the shipped backend.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;

/// File extensions recognized as DICOM studies.
const STUDY_EXTENSIONS: &[&str] = &["dcm", "dicom"];

// =============================================================================
// StudySource Trait
// =============================================================================

/// Trait for fetching complete study buffers by identifier.
#[async_trait]
pub trait StudySource: Send + Sync {
    /// Fetch the full byte buffer for a study.
    async fn fetch(&self, study_id: &str) -> Result<Bytes, StoreError>;

    /// List the study identifiers this source can serve.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}

// =============================================================================
// Filesystem Source
// =============================================================================

/// Serves `.dcm`/`.dicom` files from a directory on local disk.
///
/// Study identifiers are file names relative to the root. Identifiers that
/// would escape the root (absolute paths, `..` components) are rejected
/// before touching the filesystem.
#[derive(Debug, Clone)]
pub struct FsStudySource {
    root: PathBuf,
}

impl FsStudySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an identifier to a path under the root.
    fn resolve(&self, study_id: &str) -> Result<PathBuf, StoreError> {
        if study_id.is_empty() || study_id.contains('\\') {
            return Err(StoreError::InvalidId(study_id.to_string()));
        }
        let relative = Path::new(study_id);
        let escapes = relative.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if escapes {
            return Err(StoreError::InvalidId(study_id.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StudySource for FsStudySource {
    async fn fetch(&self, study_id: &str) -> Result<Bytes, StoreError> {
        let path = self.resolve(study_id)?;
        debug!(study_id, path = %path.display(), "reading study from disk");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(study_id.to_string()))
            }
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let path = entry.path();
            let is_study = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    STUDY_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
                .unwrap_or(false);
            if !is_study {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
