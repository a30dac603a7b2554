//! Specialized anomaly checks that run between the schema validator and the
//! deduplicator. A Remove issued here is final; the meaningful-zero and
//! sector-preservation rules act as guards that short-circuit the generic
//! removal heuristics they would otherwise trigger.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    CITATION_YEAR_CONFIDENCE, COMPOUND_TERM_CONFIDENCE, DEFAULT_ZERO_KEEP_CONFIDENCE,
    LOW_INFORMATION_CONFIDENCE, MEANINGFUL_ZERO_CONFIDENCE,
};
use crate::domain::{DecisionReason, MetricType, Sector, Unit, ValidationDecision};
use crate::pipeline::processing::classify::context_mentions_ict;

// Citation shapes: "(2024)", "Smith (2024)", "et al. 2024". The year must
// be parenthesized or follow an "et al."; a plain capitalized word before a
// year ("The 2024 survey") is ordinary prose, not a citation.
static CITATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(?:19|20)\d{2}\s*\)|et al\.?,?\s+(?:19|20)\d{2}").unwrap()
});

/// Survey/finding vocabulary that marks a zero as reported data.
const MEANINGFUL_ZERO_TERMS: &[&str] = &[
    "survey",
    "study",
    "finding",
    "observed",
    "reported",
    "no change",
    "zero growth",
];

pub struct AnomalyScreen;

impl AnomalyScreen {
    pub fn new() -> Self {
        Self
    }

    /// Re-examine an upstream decision. Upstream removals pass through
    /// untouched; keeps can be vetoed or confirmed.
    pub fn screen(&self, decision: ValidationDecision) -> ValidationDecision {
        if decision.is_removed() {
            return decision;
        }

        let candidate = decision.candidate.clone();

        // Publication years must never be treated as metric values.
        if let Some(year) = candidate.year {
            let integral = candidate.value.fract() == 0.0 && candidate.value as i32 == year;
            if integral && CITATION_RE.is_match(&candidate.context) {
                return ValidationDecision::remove(
                    candidate,
                    DecisionReason::CitationYear,
                    CITATION_YEAR_CONFIDENCE,
                );
            }
        }

        // A digit split out of a compound term ("COVID-19", "Fortune-500").
        // Adjacency was recorded at the match site, so a value that merely
        // coincides with a compound digit elsewhere in the context survives.
        if candidate.glued_to_term {
            return ValidationDecision::remove(
                candidate,
                DecisionReason::CompoundTerm,
                COMPOUND_TERM_CONFIDENCE,
            );
        }

        // Zero is data, not noise, unless proven otherwise. The guard runs
        // before any generic zero filter could.
        if candidate.value == 0.0 {
            let lower = candidate.context.to_lowercase();
            if MEANINGFUL_ZERO_TERMS.iter().any(|t| lower.contains(t)) {
                return ValidationDecision::keep(
                    candidate,
                    DecisionReason::MeaningfulZero,
                    MEANINGFUL_ZERO_CONFIDENCE,
                );
            }
            return ValidationDecision::keep(
                candidate,
                DecisionReason::DefaultKeep,
                DEFAULT_ZERO_KEEP_CONFIDENCE,
            );
        }

        // Generic low-information heuristic: a bare count with no metric
        // type and no year carries nothing worth keeping. ICT records are
        // exempt; they may still fall to unrelated rules later.
        if candidate.unit == Unit::Count
            && candidate.metric_type == MetricType::Unknown
            && candidate.year.is_none()
        {
            if candidate.sector == Sector::Ict || context_mentions_ict(&candidate.context) {
                let confidence = candidate.confidence;
                return ValidationDecision::keep(
                    candidate,
                    DecisionReason::SectorPreserved,
                    confidence,
                );
            }
            return ValidationDecision::remove(
                candidate,
                DecisionReason::LowInformation,
                LOW_INFORMATION_CONFIDENCE,
            );
        }

        decision
    }
}

impl Default for AnomalyScreen {
    fn default() -> Self {
        Self::new()
    }
}
