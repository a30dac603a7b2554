//! In-memory metric store for development and testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::app::ports::MetricStorePort;
use crate::domain::CleanedRow;
use crate::error::{PipelineError, Result};

pub struct InMemoryMetricStore {
    rows: Arc<Mutex<HashMap<String, Vec<CleanedRow>>>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryMetricStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricStorePort for InMemoryMetricStore {
    async fn replace_source(
        &self,
        source_id: &str,
        rows: &[CleanedRow],
        unacknowledged_alarms: usize,
    ) -> Result<()> {
        let mut map = self.rows.lock().unwrap();
        let destructive = map.get(source_id).map(|r| !r.is_empty()).unwrap_or(false);
        if destructive && unacknowledged_alarms > 0 {
            return Err(PipelineError::UnacknowledgedAlarms {
                count: unacknowledged_alarms,
            });
        }
        debug!("Storing {} rows for source {}", rows.len(), source_id);
        map.insert(source_id.to_string(), rows.to_vec());
        Ok(())
    }

    async fn rows_for_source(&self, source_id: &str) -> Result<Vec<CleanedRow>> {
        let map = self.rows.lock().unwrap();
        Ok(map.get(source_id).cloned().unwrap_or_default())
    }
}
