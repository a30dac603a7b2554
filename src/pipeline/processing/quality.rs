//! Per-source quality scoring. Produces the `QualityRecord` appended to the
//! run history and raises operator-facing threshold alarms; alarms are
//! surfaced, never fatal.

use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::AlarmThresholds;
use crate::domain::{DecisionAction, QualityRecord, ThresholdAlarm, ValidationDecision};

pub struct QualityScorer {
    thresholds: AlarmThresholds,
}

impl QualityScorer {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(
        &self,
        source_id: &str,
        checksum: Option<String>,
        decisions: &[ValidationDecision],
    ) -> QualityRecord {
        let total = decisions.len() as u64;
        let mut kept = 0u64;
        let mut removed = 0u64;
        let mut modified = 0u64;
        let mut zeroes = 0u64;
        let mut removal_reasons: BTreeMap<String, u64> = BTreeMap::new();

        for decision in decisions {
            match decision.action {
                DecisionAction::Keep => kept += 1,
                DecisionAction::Modify => modified += 1,
                DecisionAction::Remove => {
                    removed += 1;
                    *removal_reasons
                        .entry(decision.reason.to_string())
                        .or_insert(0) += 1;
                }
            }
            if decision.candidate.value == 0.0 {
                zeroes += 1;
            }
        }

        let quality_score = if total > 0 {
            kept as f64 / total as f64
        } else {
            0.0
        };
        let removal_rate = if total > 0 {
            removed as f64 / total as f64
        } else {
            0.0
        };
        let zero_value_fraction = if total > 0 {
            zeroes as f64 / total as f64
        } else {
            0.0
        };

        let mut alarms = Vec::new();
        if total > 0 {
            if removal_rate > self.thresholds.max_removal_rate {
                alarms.push(ThresholdAlarm::HighRemovalRate { rate: removal_rate });
            }
            if quality_score < self.thresholds.min_quality_score {
                alarms.push(ThresholdAlarm::LowQualityScore {
                    score: quality_score,
                });
            }
            if zero_value_fraction > self.thresholds.max_zero_value_fraction {
                alarms.push(ThresholdAlarm::HighZeroValueFraction {
                    fraction: zero_value_fraction,
                });
            }
        }

        QualityRecord {
            run_id: Uuid::new_v4(),
            source_id: source_id.to_string(),
            checksum,
            total,
            kept,
            removed,
            modified,
            quality_score,
            zero_value_fraction,
            removal_reasons,
            alarms,
            recorded_at: Utc::now(),
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(AlarmThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candidate, DecisionReason, MetricType, Sector, Unit};

    fn decision(value: f64, action: DecisionAction, reason: DecisionReason) -> ValidationDecision {
        let candidate = Candidate {
            value,
            unit: Unit::Percentage,
            year: Some(2024),
            metric_type: MetricType::Growth,
            sector: Sector::Unknown,
            context: "growth context".to_string(),
            source_id: "r.pdf".to_string(),
            page: 1,
            position: 0,
            glued_to_term: false,
            confidence: 0.7,
        };
        match action {
            DecisionAction::Remove => ValidationDecision::remove(candidate, reason, 0.9),
            _ => ValidationDecision::keep(candidate, reason, 0.7),
        }
    }

    #[test]
    fn test_quality_score_is_kept_over_total() {
        let scorer = QualityScorer::default();
        let decisions = vec![
            decision(10.0, DecisionAction::Keep, DecisionReason::SchemaValid),
            decision(10.0, DecisionAction::Remove, DecisionReason::Duplicate),
            decision(20.0, DecisionAction::Remove, DecisionReason::OutOfRange),
            decision(30.0, DecisionAction::Keep, DecisionReason::SchemaValid),
        ];
        let record = scorer.score("r.pdf", None, &decisions);
        assert_eq!(record.total, 4);
        assert_eq!(record.kept, 2);
        assert_eq!(record.removed, 2);
        assert_eq!(record.quality_score, 0.5);
        assert_eq!(record.removal_reasons.get("duplicate"), Some(&1));
        assert_eq!(record.removal_reasons.get("out_of_range"), Some(&1));
        assert!(record.alarms.is_empty());
    }

    #[test]
    fn test_high_removal_rate_raises_alarm() {
        let scorer = QualityScorer::default();
        let mut decisions = vec![decision(
            10.0,
            DecisionAction::Keep,
            DecisionReason::SchemaValid,
        )];
        for _ in 0..19 {
            decisions.push(decision(
                10.0,
                DecisionAction::Remove,
                DecisionReason::Duplicate,
            ));
        }
        let record = scorer.score("r.pdf", None, &decisions);
        assert!(record
            .alarms
            .iter()
            .any(|a| matches!(a, ThresholdAlarm::HighRemovalRate { .. })));
        assert!(record
            .alarms
            .iter()
            .any(|a| matches!(a, ThresholdAlarm::LowQualityScore { .. })));
    }

    #[test]
    fn test_zero_fraction_alarm() {
        let scorer = QualityScorer::default();
        let decisions = vec![
            decision(0.0, DecisionAction::Keep, DecisionReason::DefaultKeep),
            decision(0.0, DecisionAction::Keep, DecisionReason::DefaultKeep),
            decision(5.0, DecisionAction::Keep, DecisionReason::SchemaValid),
        ];
        let record = scorer.score("r.pdf", None, &decisions);
        assert!(record
            .alarms
            .iter()
            .any(|a| matches!(a, ThresholdAlarm::HighZeroValueFraction { .. })));
    }

    #[test]
    fn test_empty_run_scores_zero_without_alarms() {
        let scorer = QualityScorer::default();
        let record = scorer.score("r.pdf", None, &[]);
        assert_eq!(record.total, 0);
        assert_eq!(record.quality_score, 0.0);
        assert!(record.alarms.is_empty());
    }
}
