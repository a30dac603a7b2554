//! Append-only NDJSON quality history. Records are never rewritten; later
//! runs append new lines for trend analysis. Concurrent writers coordinate
//! through an exclusive file lock.

use async_trait::async_trait;
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app::ports::QualityHistoryPort;
use crate::domain::{HistoryAggregate, QualityRecord};
use crate::error::{PipelineError, Result};

pub struct QualityHistoryLog {
    path: PathBuf,
}

impl QualityHistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append_line(&self, record: &QualityRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()
            .map_err(|e| PipelineError::History(format!("failed to lock history log: {}", e)))?;

        let line = serde_json::to_string(record)?;
        let mut file = file;
        writeln!(file, "{}", line)?;
        file.flush()?;
        // Lock is released when the file is dropped
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<QualityRecord>> {
        if !Path::new(&self.path).exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: QualityRecord = serde_json::from_str(line)?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl QualityHistoryPort for QualityHistoryLog {
    async fn append(&self, record: &QualityRecord) -> Result<()> {
        self.append_line(record)
    }

    async fn latest(&self, source_id: &str) -> Result<Option<QualityRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.source_id == source_id)
            .last())
    }

    async fn trend(&self, source_id: &str) -> Result<Vec<QualityRecord>> {
        let mut records: Vec<QualityRecord> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.source_id == source_id)
            .collect();
        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    async fn aggregate(&self) -> Result<HistoryAggregate> {
        let records = self.read_all()?;
        let runs = records.len() as u64;
        let sources: HashSet<&str> = records.iter().map(|r| r.source_id.as_str()).collect();
        let total_candidates: u64 = records.iter().map(|r| r.total).sum();
        let total_kept: u64 = records.iter().map(|r| r.kept).sum();
        let total_removed: u64 = records.iter().map(|r| r.removed).sum();
        let mean_quality_score = if runs > 0 {
            records.iter().map(|r| r.quality_score).sum::<f64>() / runs as f64
        } else {
            0.0
        };
        Ok(HistoryAggregate {
            sources: sources.len() as u64,
            runs,
            total_candidates,
            total_kept,
            total_removed,
            mean_quality_score,
        })
    }
}
