//! Declarative per-metric-type schema validation.
//!
//! Each metric type owns a static rule record: valid units, a numeric range,
//! and an any-of set of expected context terms. Hard violations (unit, range)
//! remove the candidate; a missing context term only flags it for manual
//! review. Validation is a deterministic pure function of candidate + schema,
//! so re-validating a kept candidate never changes the action.

use crate::constants::{HARD_RULE_CONFIDENCE, SOFT_CONTEXT_CONFIDENCE};
use crate::domain::{Candidate, DecisionReason, MetricType, Unit, ValidationDecision};

/// Rule record for one metric type. Immutable configuration data.
pub struct MetricSchema {
    pub valid_units: &'static [Unit],
    pub value_range: (f64, f64),
    pub required_context_terms: &'static [&'static str],
}

static ADOPTION_RATE: MetricSchema = MetricSchema {
    valid_units: &[Unit::Percentage],
    value_range: (0.0, 100.0),
    required_context_terms: &["adoption", "adopt", "uptake", "penetration", "use"],
};

static INVESTMENT: MetricSchema = MetricSchema {
    valid_units: &[
        Unit::CurrencyMillion,
        Unit::CurrencyBillion,
        Unit::CurrencyTrillion,
    ],
    value_range: (0.0, 100_000.0),
    required_context_terms: &["investment", "invest", "funding", "spending", "capital"],
};

static PRODUCTIVITY: MetricSchema = MetricSchema {
    valid_units: &[Unit::Percentage, Unit::Ratio],
    value_range: (-50.0, 500.0),
    required_context_terms: &["productivity", "output", "efficiency"],
};

// Employment never accepts currency units; that cross-field rule lives in
// this unit whitelist.
static EMPLOYMENT: MetricSchema = MetricSchema {
    valid_units: &[Unit::Percentage, Unit::Count],
    value_range: (0.0, 1_000_000_000.0),
    required_context_terms: &["employment", "job", "jobs", "workforce", "labor"],
};

static COST: MetricSchema = MetricSchema {
    valid_units: &[
        Unit::CurrencyMillion,
        Unit::CurrencyBillion,
        Unit::CurrencyTrillion,
        Unit::Percentage,
    ],
    value_range: (0.0, 100_000.0),
    required_context_terms: &["cost", "costs", "expense", "price", "saving"],
};

static GROWTH: MetricSchema = MetricSchema {
    valid_units: &[Unit::Percentage, Unit::Ratio],
    value_range: (-100.0, 1_000.0),
    required_context_terms: &["growth", "increase", "decline", "change", "expansion"],
};

static UNKNOWN: MetricSchema = MetricSchema {
    valid_units: &[
        Unit::Percentage,
        Unit::CurrencyMillion,
        Unit::CurrencyBillion,
        Unit::CurrencyTrillion,
        Unit::Ratio,
        Unit::Count,
    ],
    value_range: (f64::MIN, f64::MAX),
    required_context_terms: &[],
};

impl MetricSchema {
    pub fn for_metric(metric_type: MetricType) -> &'static MetricSchema {
        match metric_type {
            MetricType::AdoptionRate => &ADOPTION_RATE,
            MetricType::Investment => &INVESTMENT,
            MetricType::Productivity => &PRODUCTIVITY,
            MetricType::Employment => &EMPLOYMENT,
            MetricType::Cost => &COST,
            MetricType::Growth => &GROWTH,
            MetricType::Unknown => &UNKNOWN,
        }
    }
}

pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, candidate: &Candidate) -> ValidationDecision {
        let schema = MetricSchema::for_metric(candidate.metric_type);

        if !schema.valid_units.contains(&candidate.unit) {
            return ValidationDecision::remove(
                candidate.clone(),
                DecisionReason::InvalidUnit,
                HARD_RULE_CONFIDENCE,
            );
        }

        let (min, max) = schema.value_range;
        if candidate.value < min || candidate.value > max {
            return ValidationDecision::remove(
                candidate.clone(),
                DecisionReason::OutOfRange,
                HARD_RULE_CONFIDENCE,
            );
        }

        if !schema.required_context_terms.is_empty() {
            let lower = candidate.context.to_lowercase();
            let any_present = schema
                .required_context_terms
                .iter()
                .any(|term| lower.contains(term));
            if !any_present {
                let mut decision = ValidationDecision::keep(
                    candidate.clone(),
                    DecisionReason::MissingContextTerms,
                    SOFT_CONTEXT_CONFIDENCE,
                );
                decision.needs_review = true;
                return decision;
            }
        }

        ValidationDecision::keep(
            candidate.clone(),
            DecisionReason::SchemaValid,
            candidate.confidence,
        )
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}
