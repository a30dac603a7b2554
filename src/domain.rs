//! Domain data shapes shared across layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// One segmented page of text from the extraction backend.
///
/// The backend is a black box: it may hand us bytes that are not valid
/// UTF-8, which the extractor reports as a per-page extraction failure.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub page_number: u32,
    pub content: Vec<u8>,
    pub bbox: Option<[f64; 4]>,
}

/// Measurement unit attached to an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percentage,
    CurrencyMillion,
    CurrencyBillion,
    CurrencyTrillion,
    Ratio,
    Count,
}

impl Unit {
    pub fn is_currency(&self) -> bool {
        matches!(
            self,
            Unit::CurrencyMillion | Unit::CurrencyBillion | Unit::CurrencyTrillion
        )
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unit::Percentage => "percentage",
            Unit::CurrencyMillion => "currency_million",
            Unit::CurrencyBillion => "currency_billion",
            Unit::CurrencyTrillion => "currency_trillion",
            Unit::Ratio => "ratio",
            Unit::Count => "count",
        };
        write!(f, "{}", name)
    }
}

/// Metric type assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    AdoptionRate,
    Investment,
    Productivity,
    Employment,
    Cost,
    Growth,
    Unknown,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::AdoptionRate => "adoption_rate",
            MetricType::Investment => "investment",
            MetricType::Productivity => "productivity",
            MetricType::Employment => "employment",
            MetricType::Cost => "cost",
            MetricType::Growth => "growth",
            MetricType::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Economic sector assigned by the classifier.
///
/// ICT is a protected classification: once assigned it is never downgraded
/// to Unknown, and ICT records are exempt from generic low-value removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Ict,
    Healthcare,
    Manufacturing,
    Agriculture,
    Finance,
    Education,
    Unknown,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sector::Ict => "ict",
            Sector::Healthcare => "healthcare",
            Sector::Manufacturing => "manufacturing",
            Sector::Agriculture => "agriculture",
            Sector::Finance => "finance",
            Sector::Education => "education",
            Sector::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Stable identity of a candidate within a run: source plus character offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId {
    pub source_id: String,
    pub position: usize,
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.position)
    }
}

/// A single numeric extraction, before validation.
///
/// Created by the extractor, enriched (sector/metric_type/confidence) by the
/// classifier. Downstream stages never mutate a candidate; they produce
/// decision records referencing it by `(source_id, position)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub value: f64,
    pub unit: Unit,
    pub year: Option<i32>,
    pub metric_type: MetricType,
    pub sector: Sector,
    /// Surrounding text, whitespace-normalized, at least 150 chars each way.
    pub context: String,
    pub source_id: String,
    pub page: u32,
    /// Document-global character offset of the match; stable ordering key.
    pub position: usize,
    /// The matched digits directly follow a hyphen-joined alphabetic token
    /// (the 19 in "COVID-19"). Recorded at extraction, where the match site
    /// is known; a value that merely coincides with a compound digit
    /// elsewhere in the context does not set this.
    #[serde(default)]
    pub glued_to_term: bool,
    pub confidence: f64,
}

impl Candidate {
    pub fn id(&self) -> CandidateId {
        CandidateId {
            source_id: self.source_id.clone(),
            position: self.position,
        }
    }
}

/// The verdict on one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Keep,
    Remove,
    Modify,
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionAction::Keep => "keep",
            DecisionAction::Remove => "remove",
            DecisionAction::Modify => "modify",
        };
        write!(f, "{}", name)
    }
}

/// Why a decision was taken. Stable snake_case wire names; every remove or
/// modify reason doubles as the human-readable rationale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    SchemaValid,
    DefaultKeep,
    MissingContextTerms,
    InvalidUnit,
    OutOfRange,
    CitationYear,
    CompoundTerm,
    MeaningfulZero,
    SectorPreserved,
    LowInformation,
    Duplicate,
    ReviewAccepted,
    ReviewRejected,
    ReviewModified,
}

impl DecisionReason {
    /// Reasons produced by generic low-value heuristics. ICT-protected
    /// candidates must never be removed with one of these.
    pub fn is_generic_heuristic(&self) -> bool {
        matches!(self, DecisionReason::LowInformation)
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionReason::SchemaValid => "schema_valid",
            DecisionReason::DefaultKeep => "default_keep",
            DecisionReason::MissingContextTerms => "missing_context_terms",
            DecisionReason::InvalidUnit => "invalid_unit",
            DecisionReason::OutOfRange => "out_of_range",
            DecisionReason::CitationYear => "citation_year",
            DecisionReason::CompoundTerm => "compound_term",
            DecisionReason::MeaningfulZero => "meaningful_zero",
            DecisionReason::SectorPreserved => "sector_preserved",
            DecisionReason::LowInformation => "low_information",
            DecisionReason::Duplicate => "duplicate",
            DecisionReason::ReviewAccepted => "review_accepted",
            DecisionReason::ReviewRejected => "review_rejected",
            DecisionReason::ReviewModified => "review_modified",
        };
        write!(f, "{}", name)
    }
}

/// Output of the validator/anomaly/dedup stages for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationDecision {
    pub candidate: Candidate,
    pub action: DecisionAction,
    pub reason: DecisionReason,
    pub confidence: f64,
    /// Soft context-absence flag for manual review; never auto-rejects.
    pub needs_review: bool,
    /// Field corrections carried by a Modify decision.
    pub corrected_fields: Option<BTreeMap<String, String>>,
    /// For duplicate removals: identity of the surviving group member.
    /// Invariant: every duplicate Remove carries this link.
    pub kept_record_id: Option<CandidateId>,
}

impl ValidationDecision {
    pub fn keep(candidate: Candidate, reason: DecisionReason, confidence: f64) -> Self {
        Self {
            candidate,
            action: DecisionAction::Keep,
            reason,
            confidence,
            needs_review: false,
            corrected_fields: None,
            kept_record_id: None,
        }
    }

    pub fn remove(candidate: Candidate, reason: DecisionReason, confidence: f64) -> Self {
        Self {
            candidate,
            action: DecisionAction::Remove,
            reason,
            confidence,
            needs_review: false,
            corrected_fields: None,
            kept_record_id: None,
        }
    }

    pub fn candidate_id(&self) -> CandidateId {
        self.candidate.id()
    }

    pub fn is_removed(&self) -> bool {
        self.action == DecisionAction::Remove
    }

    pub fn survives(&self) -> bool {
        matches!(self.action, DecisionAction::Keep | DecisionAction::Modify)
    }
}

/// Operator-facing threshold alarm. Surfaced, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdAlarm {
    HighRemovalRate { rate: f64 },
    LowQualityScore { score: f64 },
    HighZeroValueFraction { fraction: f64 },
}

impl fmt::Display for ThresholdAlarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdAlarm::HighRemovalRate { rate } => {
                write!(f, "removal rate {:.1}% exceeds threshold", rate * 100.0)
            }
            ThresholdAlarm::LowQualityScore { score } => {
                write!(f, "quality score {:.1}% below threshold", score * 100.0)
            }
            ThresholdAlarm::HighZeroValueFraction { fraction } => {
                write!(f, "zero-value fraction {:.1}% exceeds threshold", fraction * 100.0)
            }
        }
    }
}

/// Per-source summary of one cleanup run. Appended to an immutable history
/// log; later runs append new records for trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityRecord {
    pub run_id: Uuid,
    pub source_id: String,
    /// SHA-256 of the source page bytes, for run provenance.
    pub checksum: Option<String>,
    pub total: u64,
    pub kept: u64,
    pub removed: u64,
    pub modified: u64,
    /// kept / total; 0 when the run produced no candidates.
    pub quality_score: f64,
    pub zero_value_fraction: f64,
    pub removal_reasons: BTreeMap<String, u64>,
    pub alarms: Vec<ThresholdAlarm>,
    pub recorded_at: DateTime<Utc>,
}

impl fmt::Display for QualityRecord {
    /// Human-readable summary, derived from the same in-memory record that
    /// the machine-parseable NDJSON line is serialized from.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} candidates, {} kept, {} removed, {} modified, quality {:.1}%",
            self.source_id,
            self.recorded_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total,
            self.kept,
            self.removed,
            self.modified,
            self.quality_score * 100.0,
        )?;
        if !self.removal_reasons.is_empty() {
            let reasons: Vec<String> = self
                .removal_reasons
                .iter()
                .map(|(reason, count)| format!("{}={}", reason, count))
                .collect();
            write!(f, " ({})", reasons.join(", "))?;
        }
        for alarm in &self.alarms {
            write!(f, " ⚠ {}", alarm)?;
        }
        Ok(())
    }
}

/// Cross-source rollup of the quality history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAggregate {
    pub sources: u64,
    pub runs: u64,
    pub total_candidates: u64,
    pub total_kept: u64,
    pub total_removed: u64,
    pub mean_quality_score: f64,
}

/// One row of the persistent store contract consumed by the dashboard layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRow {
    pub source: String,
    pub position: usize,
    pub value: f64,
    pub unit: String,
    pub year: Option<i32>,
    pub metric_type: String,
    pub sector: String,
    pub context: String,
    pub confidence: f64,
    pub action: String,
    pub reason: String,
    pub kept_record_id: Option<String>,
}

impl From<&ValidationDecision> for CleanedRow {
    fn from(decision: &ValidationDecision) -> Self {
        let c = &decision.candidate;
        Self {
            source: c.source_id.clone(),
            position: c.position,
            value: c.value,
            unit: c.unit.to_string(),
            year: c.year,
            metric_type: c.metric_type.to_string(),
            sector: c.sector.to_string(),
            context: c.context.clone(),
            confidence: decision.confidence,
            action: decision.action.to_string(),
            reason: decision.reason.to_string(),
            kept_record_id: decision.kept_record_id.as_ref().map(|id| id.to_string()),
        }
    }
}
