//! Metrics instrumentation for the cleanup pipeline.
//!
//! All metric names live in one enum to eliminate magic strings and keep
//! the Prometheus naming conventions in one place.

use std::fmt;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Extractor metrics
    ExtractorPagesProcessed,
    ExtractorPagesSkipped,
    ExtractorCandidatesFound,

    // Classifier metrics
    ClassifierRecordsProcessed,
    ClassifierUnknownSector,
    ClassifierUnknownMetricType,

    // Validator metrics
    ValidatorRemovals,
    ValidatorReviewFlags,

    // Anomaly detector metrics
    AnomalyCitationYears,
    AnomalyCompoundTerms,
    AnomalyMeaningfulZeros,
    AnomalySectorPreserved,
    AnomalyLowInformationRemovals,

    // Deduplication metrics
    DedupGroups,
    DedupDuplicatesRemoved,

    // Quality tracking metrics
    QualityScore,
    QualityAlarmsRaised,
    HistoryAppendsSuccess,
    HistoryAppendsError,

    // Cleanup run metrics
    CleanupSourcesProcessed,
    CleanupSourcesFailed,
    CleanupDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExtractorPagesProcessed => "econ_extractor_pages_processed_total",
            MetricName::ExtractorPagesSkipped => "econ_extractor_pages_skipped_total",
            MetricName::ExtractorCandidatesFound => "econ_extractor_candidates_found_total",

            MetricName::ClassifierRecordsProcessed => "econ_classifier_records_processed_total",
            MetricName::ClassifierUnknownSector => "econ_classifier_unknown_sector_total",
            MetricName::ClassifierUnknownMetricType => "econ_classifier_unknown_metric_type_total",

            MetricName::ValidatorRemovals => "econ_validator_removals_total",
            MetricName::ValidatorReviewFlags => "econ_validator_review_flags_total",

            MetricName::AnomalyCitationYears => "econ_anomaly_citation_years_total",
            MetricName::AnomalyCompoundTerms => "econ_anomaly_compound_terms_total",
            MetricName::AnomalyMeaningfulZeros => "econ_anomaly_meaningful_zeros_total",
            MetricName::AnomalySectorPreserved => "econ_anomaly_sector_preserved_total",
            MetricName::AnomalyLowInformationRemovals => {
                "econ_anomaly_low_information_removals_total"
            }

            MetricName::DedupGroups => "econ_dedup_groups_total",
            MetricName::DedupDuplicatesRemoved => "econ_dedup_duplicates_removed_total",

            MetricName::QualityScore => "econ_quality_score",
            MetricName::QualityAlarmsRaised => "econ_quality_alarms_raised_total",
            MetricName::HistoryAppendsSuccess => "econ_history_appends_success_total",
            MetricName::HistoryAppendsError => "econ_history_appends_error_total",

            MetricName::CleanupSourcesProcessed => "econ_cleanup_sources_processed_total",
            MetricName::CleanupSourcesFailed => "econ_cleanup_sources_failed_total",
            MetricName::CleanupDuration => "econ_cleanup_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn emit_counter(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

pub fn emit_histogram(name: MetricName, value: f64) {
    ::metrics::histogram!(name.as_str()).record(value);
}
