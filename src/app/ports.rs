use async_trait::async_trait;

use crate::domain::{CleanedRow, HistoryAggregate, PageRecord, QualityRecord};
use crate::error::Result;

/// The PDF text/table extraction backend, treated as a black box producing
/// segmented page text per document.
#[async_trait]
pub trait DocumentSourcePort: Send + Sync {
    async fn fetch_pages(&self, source_id: &str) -> Result<Vec<PageRecord>>;
}

/// The persistent store consumed by the dashboard layer.
#[async_trait]
pub trait MetricStorePort: Send + Sync {
    /// Replace the rows for one source. Destructive when the source already
    /// has rows; in that case `unacknowledged_alarms > 0` must fail with
    /// `PipelineError::UnacknowledgedAlarms`.
    async fn replace_source(
        &self,
        source_id: &str,
        rows: &[CleanedRow],
        unacknowledged_alarms: usize,
    ) -> Result<()>;

    async fn rows_for_source(&self, source_id: &str) -> Result<Vec<CleanedRow>>;
}

/// Append-only quality history with trend queries. Appends must be safe for
/// concurrent writers.
#[async_trait]
pub trait QualityHistoryPort: Send + Sync {
    async fn append(&self, record: &QualityRecord) -> Result<()>;
    async fn latest(&self, source_id: &str) -> Result<Option<QualityRecord>>;
    /// Chronological sequence of records for one source.
    async fn trend(&self, source_id: &str) -> Result<Vec<QualityRecord>>;
    async fn aggregate(&self) -> Result<HistoryAggregate>;
}
