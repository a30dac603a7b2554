//! Filesystem adapter standing in for the PDF extraction backend: a source
//! id resolves to a text file (pages separated by form feeds) or a directory
//! of per-page files under the configured root.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::app::ports::DocumentSourcePort;
use crate::domain::PageRecord;
use crate::error::{PipelineError, Result};

pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, source_id: &str) -> PathBuf {
        self.root.join(source_id)
    }

    fn pages_from_file(path: &Path) -> Result<Vec<PageRecord>> {
        let bytes = std::fs::read(path)?;
        // Form feed separates pages, matching what text-dump backends emit.
        let pages = bytes
            .split(|&b| b == 0x0c)
            .enumerate()
            .map(|(i, chunk)| PageRecord {
                page_number: i as u32 + 1,
                content: chunk.to_vec(),
                bbox: None,
            })
            .collect();
        Ok(pages)
    }

    fn pages_from_dir(path: &Path) -> Result<Vec<PageRecord>> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        let mut pages = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            pages.push(PageRecord {
                page_number: i as u32 + 1,
                content: std::fs::read(entry)?,
                bbox: None,
            });
        }
        Ok(pages)
    }
}

#[async_trait]
impl DocumentSourcePort for FsDocumentSource {
    async fn fetch_pages(&self, source_id: &str) -> Result<Vec<PageRecord>> {
        let path = self.resolve(source_id);
        if !path.exists() {
            return Err(PipelineError::Store(format!(
                "document not found: {}",
                path.display()
            )));
        }
        if path.is_dir() {
            Self::pages_from_dir(&path)
        } else {
            Self::pages_from_file(&path)
        }
    }
}

/// SHA-256 over the page bytes, recorded on the quality record for run
/// provenance.
pub fn page_checksum(pages: &[PageRecord]) -> String {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(&page.content);
    }
    hex::encode(hasher.finalize())
}
