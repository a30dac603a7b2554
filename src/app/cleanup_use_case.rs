//! Orchestrates the cleanup pipeline for one source at a time: extract,
//! classify, validate, screen anomalies, dedup, score, persist. Sources are
//! independent batch jobs; a failure in one never aborts the others.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::app::ports::{DocumentSourcePort, MetricStorePort, QualityHistoryPort};
use crate::config::PipelineConfig;
use crate::domain::{CleanedRow, DecisionReason, QualityRecord, ValidationDecision};
use crate::infra::fs_document_source::page_checksum;
use crate::observability::metrics::{emit_counter, emit_gauge, emit_histogram, MetricName};
use crate::pipeline::processing::anomaly::AnomalyScreen;
use crate::pipeline::processing::classify::Classifier;
use crate::pipeline::processing::dedup::Deduplicator;
use crate::pipeline::processing::extract::Extractor;
use crate::pipeline::processing::quality::QualityScorer;
use crate::pipeline::processing::validate::SchemaValidator;
use crate::review::{merge_reviews, ReviewDecision};

/// Result of cleaning one source.
pub struct CleanupOutcome {
    pub record: QualityRecord,
    pub decisions: Vec<ValidationDecision>,
    pub pages_skipped: usize,
}

pub struct CleanupUseCase {
    extractor: Extractor,
    classifier: Classifier,
    validator: SchemaValidator,
    anomalies: AnomalyScreen,
    deduplicator: Deduplicator,
    scorer: QualityScorer,
    documents: Arc<dyn DocumentSourcePort>,
    store: Arc<dyn MetricStorePort>,
    history: Arc<dyn QualityHistoryPort>,
    acknowledge_alarms: bool,
}

impl CleanupUseCase {
    pub fn new(
        config: &PipelineConfig,
        documents: Arc<dyn DocumentSourcePort>,
        store: Arc<dyn MetricStorePort>,
        history: Arc<dyn QualityHistoryPort>,
        acknowledge_alarms: bool,
    ) -> Self {
        Self {
            extractor: Extractor::from_config(config),
            classifier: Classifier::new(),
            validator: SchemaValidator::new(),
            anomalies: AnomalyScreen::new(),
            deduplicator: Deduplicator::from_config(config),
            scorer: QualityScorer::new(config.alarms.clone()),
            documents,
            store,
            history,
            acknowledge_alarms,
        }
    }

    /// Run the full pipeline for one source and persist the outcome.
    pub async fn clean_source(&self, source_id: &str) -> Result<CleanupOutcome> {
        let start_time = std::time::Instant::now();
        info!("Starting cleanup for source: {}", source_id);

        let pages = self.documents.fetch_pages(source_id).await?;
        let checksum = page_checksum(&pages);

        // Stage 1: extraction, with per-page failure isolation.
        let extraction = self.extractor.extract_document(source_id, &pages);
        for e in &extraction.page_errors {
            warn!("Skipping page: {}", e);
            emit_counter(MetricName::ExtractorPagesSkipped, 1);
        }
        emit_counter(
            MetricName::ExtractorPagesProcessed,
            extraction.pages_processed as u64,
        );
        emit_counter(
            MetricName::ExtractorCandidatesFound,
            extraction.candidates.len() as u64,
        );
        debug!(
            "Extracted {} candidates from {} pages ({} skipped)",
            extraction.candidates.len(),
            extraction.pages_processed,
            extraction.page_errors.len()
        );

        // Stage 2: classification.
        let mut classified = Vec::with_capacity(extraction.candidates.len());
        for candidate in &extraction.candidates {
            let enriched = self.classifier.classify(candidate);
            emit_counter(MetricName::ClassifierRecordsProcessed, 1);
            if enriched.sector == crate::domain::Sector::Unknown {
                emit_counter(MetricName::ClassifierUnknownSector, 1);
            }
            if enriched.metric_type == crate::domain::MetricType::Unknown {
                emit_counter(MetricName::ClassifierUnknownMetricType, 1);
            }
            classified.push(enriched);
        }

        // Stages 3 and 4: schema validation, then anomaly screening.
        let mut decisions = Vec::with_capacity(classified.len());
        for candidate in &classified {
            let decision = self.anomalies.screen(self.validator.validate(candidate));
            match decision.reason {
                DecisionReason::InvalidUnit | DecisionReason::OutOfRange => {
                    emit_counter(MetricName::ValidatorRemovals, 1)
                }
                DecisionReason::CitationYear => emit_counter(MetricName::AnomalyCitationYears, 1),
                DecisionReason::CompoundTerm => emit_counter(MetricName::AnomalyCompoundTerms, 1),
                DecisionReason::MeaningfulZero => {
                    emit_counter(MetricName::AnomalyMeaningfulZeros, 1)
                }
                DecisionReason::SectorPreserved => {
                    emit_counter(MetricName::AnomalySectorPreserved, 1)
                }
                DecisionReason::LowInformation => {
                    emit_counter(MetricName::AnomalyLowInformationRemovals, 1)
                }
                _ => {}
            }
            if decision.needs_review {
                emit_counter(MetricName::ValidatorReviewFlags, 1);
            }
            decisions.push(decision);
        }

        // Stage 5: deduplication.
        let group_count = self.deduplicator.groups(&decisions).len();
        let decisions = self.deduplicator.dedup(decisions);
        let duplicates_removed = decisions
            .iter()
            .filter(|d| d.reason == DecisionReason::Duplicate)
            .count();
        emit_counter(MetricName::DedupGroups, group_count as u64);
        emit_counter(
            MetricName::DedupDuplicatesRemoved,
            duplicates_removed as u64,
        );
        info!(
            "Dedup removed {} of {} candidates across {} groups",
            duplicates_removed,
            decisions.len(),
            group_count
        );

        // Stage 6: quality scoring and tracking.
        let record = self.scorer.score(source_id, Some(checksum), &decisions);
        emit_gauge(MetricName::QualityScore, record.quality_score);
        for alarm in &record.alarms {
            warn!("Threshold alarm for {}: {}", source_id, alarm);
            emit_counter(MetricName::QualityAlarmsRaised, 1);
        }

        match self.history.append(&record).await {
            Ok(()) => emit_counter(MetricName::HistoryAppendsSuccess, 1),
            Err(e) => {
                emit_counter(MetricName::HistoryAppendsError, 1);
                return Err(e.into());
            }
        }

        // Persist cleaned candidates plus their final decisions. Overwriting
        // an existing source with outstanding alarms needs explicit operator
        // acknowledgment.
        let rows: Vec<CleanedRow> = decisions.iter().map(CleanedRow::from).collect();
        let unacknowledged = if self.acknowledge_alarms {
            0
        } else {
            record.alarms.len()
        };
        if let Err(e) = self
            .store
            .replace_source(source_id, &rows, unacknowledged)
            .await
        {
            error!("Failed to persist cleaned metrics for {}: {}", source_id, e);
            return Err(e.into());
        }

        let duration = start_time.elapsed();
        emit_histogram(MetricName::CleanupDuration, duration.as_secs_f64());
        info!(
            "Cleanup completed for {} in {:.2}ms: {}",
            source_id,
            duration.as_millis(),
            record
        );

        Ok(CleanupOutcome {
            record,
            decisions,
            pages_skipped: extraction.page_errors.len(),
        })
    }

    /// Merge reviewer verdicts into a run's decisions and persist the
    /// result. The quality record is recomputed from the merged decisions
    /// and appended to the history, and the overwrite goes through the same
    /// alarm gate as `clean_source`.
    pub async fn apply_reviews(
        &self,
        source_id: &str,
        decisions: Vec<ValidationDecision>,
        reviews: &[ReviewDecision],
        checksum: Option<String>,
    ) -> Result<CleanupOutcome> {
        let decisions = merge_reviews(decisions, reviews, &self.deduplicator);
        info!(
            "Merged {} reviewer verdict(s) for source {}",
            reviews.len(),
            source_id
        );

        let record = self.scorer.score(source_id, checksum, &decisions);
        for alarm in &record.alarms {
            warn!("Threshold alarm for {}: {}", source_id, alarm);
            emit_counter(MetricName::QualityAlarmsRaised, 1);
        }
        match self.history.append(&record).await {
            Ok(()) => emit_counter(MetricName::HistoryAppendsSuccess, 1),
            Err(e) => {
                emit_counter(MetricName::HistoryAppendsError, 1);
                return Err(e.into());
            }
        }

        let rows: Vec<CleanedRow> = decisions.iter().map(CleanedRow::from).collect();
        let unacknowledged = if self.acknowledge_alarms {
            0
        } else {
            record.alarms.len()
        };
        self.store
            .replace_source(source_id, &rows, unacknowledged)
            .await?;

        Ok(CleanupOutcome {
            record,
            decisions,
            pages_skipped: 0,
        })
    }

    /// Clean a batch of sources. Each source is isolated: one failure is
    /// logged and the batch continues.
    pub async fn clean_batch(&self, source_ids: &[String]) -> Vec<(String, Result<CleanupOutcome>)> {
        let mut outcomes = Vec::with_capacity(source_ids.len());
        for source_id in source_ids {
            let result = self.clean_source(source_id).await;
            match &result {
                Ok(outcome) => {
                    emit_counter(MetricName::CleanupSourcesProcessed, 1);
                    debug!(
                        "Source {} finished with quality {:.2}",
                        source_id, outcome.record.quality_score
                    );
                }
                Err(e) => {
                    emit_counter(MetricName::CleanupSourcesFailed, 1);
                    error!("Cleanup failed for {}: {}", source_id, e);
                }
            }
            outcomes.push((source_id.clone(), result));
        }
        outcomes
    }
}
