//! SQLite-backed metric store. One row per candidate decision; the dashboard
//! layer filters on `action = 'keep'`.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::app::ports::MetricStorePort;
use crate::domain::CleanedRow;
use crate::error::{PipelineError, Result};

pub struct SqliteMetricStore {
    conn: Mutex<Connection>,
}

impl SqliteMetricStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cleaned_metrics (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                position INTEGER NOT NULL,
                value REAL NOT NULL,
                unit TEXT NOT NULL,
                year INTEGER,
                metric_type TEXT NOT NULL,
                sector TEXT NOT NULL,
                context TEXT NOT NULL,
                confidence REAL NOT NULL,
                action TEXT NOT NULL,
                reason TEXT NOT NULL,
                kept_record_id TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_cleaned_metrics_source
                ON cleaned_metrics(source);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cleaned_metrics (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                position INTEGER NOT NULL,
                value REAL NOT NULL,
                unit TEXT NOT NULL,
                year INTEGER,
                metric_type TEXT NOT NULL,
                sector TEXT NOT NULL,
                context TEXT NOT NULL,
                confidence REAL NOT NULL,
                action TEXT NOT NULL,
                reason TEXT NOT NULL,
                kept_record_id TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl MetricStorePort for SqliteMetricStore {
    async fn replace_source(
        &self,
        source_id: &str,
        rows: &[CleanedRow],
        unacknowledged_alarms: usize,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();

        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cleaned_metrics WHERE source = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        if existing > 0 && unacknowledged_alarms > 0 {
            return Err(PipelineError::UnacknowledgedAlarms {
                count: unacknowledged_alarms,
            });
        }

        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM cleaned_metrics WHERE source = ?1",
            params![source_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cleaned_metrics
                    (source, position, value, unit, year, metric_type, sector,
                     context, confidence, action, reason, kept_record_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.source,
                    row.position as i64,
                    row.value,
                    row.unit,
                    row.year,
                    row.metric_type,
                    row.sector,
                    row.context,
                    row.confidence,
                    row.action,
                    row.reason,
                    row.kept_record_id,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Stored {} rows for source {}", rows.len(), source_id);
        Ok(())
    }

    async fn rows_for_source(&self, source_id: &str) -> Result<Vec<CleanedRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source, position, value, unit, year, metric_type, sector,
                    context, confidence, action, reason, kept_record_id
             FROM cleaned_metrics WHERE source = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![source_id], |row| {
                Ok(CleanedRow {
                    source: row.get(0)?,
                    position: row.get::<_, i64>(1)? as usize,
                    value: row.get(2)?,
                    unit: row.get(3)?,
                    year: row.get(4)?,
                    metric_type: row.get(5)?,
                    sector: row.get(6)?,
                    context: row.get(7)?,
                    confidence: row.get(8)?,
                    action: row.get(9)?,
                    reason: row.get(10)?,
                    kept_record_id: row.get(11)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
