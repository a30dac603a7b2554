//! Sector and metric-type classification via ordered keyword/phrase tables.
//!
//! Tables are immutable configuration data, built once and never mutated at
//! runtime. Ties are broken by match specificity: a multi-word phrase match
//! outranks a single keyword, and the first-registered rule wins further
//! ties. ICT is registered first and its classification is a hard invariant
//! carried into the anomaly stage.

use once_cell::sync::Lazy;

use crate::constants::{
    DEFAULT_CLASSIFICATION_CONFIDENCE, KEYWORD_MATCH_CONFIDENCE, PHRASE_MATCH_CONFIDENCE,
};
use crate::domain::{Candidate, MetricType, Sector};

struct SectorRule {
    sector: Sector,
    phrases: &'static [&'static str],
    keywords: &'static [&'static str],
}

struct MetricRule {
    metric_type: MetricType,
    phrases: &'static [&'static str],
    keywords: &'static [&'static str],
}

/// ICT trigger set, shared with the sector-preservation override in the
/// anomaly stage.
pub const ICT_PHRASES: &[&str] = &[
    "information and communication technology",
    "digital infrastructure",
];
pub const ICT_KEYWORDS: &[&str] = &["ict", "telecom", "telecommunications", "broadband"];

static SECTOR_RULES: Lazy<Vec<SectorRule>> = Lazy::new(|| {
    vec![
        // ICT first: first-registered wins ties and this classification is
        // protected downstream.
        SectorRule {
            sector: Sector::Ict,
            phrases: ICT_PHRASES,
            keywords: ICT_KEYWORDS,
        },
        SectorRule {
            sector: Sector::Healthcare,
            phrases: &["health care system", "public health"],
            keywords: &["healthcare", "hospital", "medical", "patient"],
        },
        SectorRule {
            sector: Sector::Manufacturing,
            phrases: &["manufacturing sector", "industrial production"],
            keywords: &["manufacturing", "factory", "industrial"],
        },
        SectorRule {
            sector: Sector::Agriculture,
            phrases: &["agricultural sector", "food production"],
            keywords: &["agriculture", "farming", "crop", "livestock"],
        },
        SectorRule {
            sector: Sector::Finance,
            phrases: &["financial services", "banking sector"],
            keywords: &["finance", "banking", "fintech", "insurance"],
        },
        SectorRule {
            sector: Sector::Education,
            phrases: &["higher education", "education sector"],
            keywords: &["education", "school", "university", "training"],
        },
    ]
});

static METRIC_RULES: Lazy<Vec<MetricRule>> = Lazy::new(|| {
    vec![
        MetricRule {
            metric_type: MetricType::AdoptionRate,
            phrases: &["adoption rate", "technology adoption", "digital adoption"],
            keywords: &["adoption", "uptake", "penetration"],
        },
        MetricRule {
            metric_type: MetricType::Investment,
            phrases: &["capital expenditure", "foreign direct investment"],
            keywords: &["investment", "funding", "invested", "spending"],
        },
        MetricRule {
            metric_type: MetricType::Productivity,
            phrases: &["labor productivity", "output per worker"],
            keywords: &["productivity", "efficiency"],
        },
        MetricRule {
            metric_type: MetricType::Employment,
            phrases: &["employment rate", "job creation"],
            keywords: &["employment", "jobs", "workforce", "hiring", "employed"],
        },
        MetricRule {
            metric_type: MetricType::Cost,
            phrases: &["cost savings", "operating costs"],
            keywords: &["cost", "costs", "expense", "price"],
        },
        MetricRule {
            metric_type: MetricType::Growth,
            phrases: &["growth rate", "year-over-year growth"],
            keywords: &["growth", "increase", "decline", "expansion", "grew"],
        },
    ]
});

/// Returns true when the context matches any ICT trigger.
pub fn context_mentions_ict(context: &str) -> bool {
    let lower = context.to_lowercase();
    ICT_PHRASES.iter().any(|p| lower.contains(p))
        || ICT_KEYWORDS.iter().any(|k| contains_word(&lower, k))
}

/// Keyword/context classifier. Produces an enriched copy of the candidate;
/// the input is never mutated.
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, candidate: &Candidate) -> Candidate {
        let lower = candidate.context.to_lowercase();
        let (sector, sector_confidence) = self.match_sector(&lower);
        let (metric_type, metric_confidence) = self.match_metric(&lower);

        let mut enriched = candidate.clone();
        enriched.sector = sector;
        enriched.metric_type = metric_type;
        enriched.confidence = sector_confidence.max(metric_confidence);
        enriched
    }

    fn match_sector(&self, context_lower: &str) -> (Sector, f64) {
        for rule in SECTOR_RULES.iter() {
            if rule.phrases.iter().any(|p| context_lower.contains(p)) {
                return (rule.sector, PHRASE_MATCH_CONFIDENCE);
            }
        }
        for rule in SECTOR_RULES.iter() {
            if rule.keywords.iter().any(|k| contains_word(context_lower, k)) {
                return (rule.sector, KEYWORD_MATCH_CONFIDENCE);
            }
        }
        (Sector::Unknown, DEFAULT_CLASSIFICATION_CONFIDENCE)
    }

    fn match_metric(&self, context_lower: &str) -> (MetricType, f64) {
        for rule in METRIC_RULES.iter() {
            if rule.phrases.iter().any(|p| context_lower.contains(p)) {
                return (rule.metric_type, PHRASE_MATCH_CONFIDENCE);
            }
        }
        for rule in METRIC_RULES.iter() {
            if rule.keywords.iter().any(|k| contains_word(context_lower, k)) {
                return (rule.metric_type, KEYWORD_MATCH_CONFIDENCE);
            }
        }
        (MetricType::Unknown, DEFAULT_CLASSIFICATION_CONFIDENCE)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-word containment; "ict" must not fire inside "strict".
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|w| w == word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Unit;

    fn candidate(context: &str) -> Candidate {
        Candidate {
            value: 10.0,
            unit: Unit::Percentage,
            year: Some(2024),
            metric_type: MetricType::Unknown,
            sector: Sector::Unknown,
            context: context.to_string(),
            source_id: "r.pdf".to_string(),
            page: 1,
            position: 0,
            glued_to_term: false,
            confidence: 0.5,
        }
    }

    #[test]
    fn test_phrase_match_outranks_keyword() {
        let classifier = Classifier::new();
        // "hospital" (healthcare keyword) also present, but the ICT phrase wins
        let enriched = classifier.classify(&candidate(
            "investment in information and communication technology near the hospital district",
        ));
        assert_eq!(enriched.sector, Sector::Ict);
        assert_eq!(enriched.confidence, 0.9);
    }

    #[test]
    fn test_keyword_match_gets_lower_confidence() {
        let classifier = Classifier::new();
        let enriched = classifier.classify(&candidate("telecom operators reported results"));
        assert_eq!(enriched.sector, Sector::Ict);
        // sector keyword 0.7; no metric match raises it higher
        assert_eq!(enriched.confidence, 0.7);
    }

    #[test]
    fn test_unmatched_context_defaults_to_unknown() {
        let classifier = Classifier::new();
        let enriched = classifier.classify(&candidate("the weather was pleasant that afternoon"));
        assert_eq!(enriched.sector, Sector::Unknown);
        assert_eq!(enriched.metric_type, MetricType::Unknown);
        assert_eq!(enriched.confidence, 0.5);
    }

    #[test]
    fn test_metric_type_classification() {
        let classifier = Classifier::new();
        let enriched = classifier.classify(&candidate("the adoption rate among manufacturers rose"));
        assert_eq!(enriched.metric_type, MetricType::AdoptionRate);
        assert_eq!(enriched.confidence, 0.9);
    }

    #[test]
    fn test_ict_keyword_is_whole_word() {
        assert!(context_mentions_ict("national ICT spending grew"));
        assert!(!context_mentions_ict("strict rules applied"));
    }

    #[test]
    fn test_input_candidate_is_not_mutated() {
        let classifier = Classifier::new();
        let original = candidate("telecom adoption rate");
        let _ = classifier.classify(&original);
        assert_eq!(original.sector, Sector::Unknown);
        assert_eq!(original.confidence, 0.5);
    }
}
