//! Duplicate grouping and removal. The dominant volume reducer of the
//! pipeline; the `kept_record_id` traceability link on every duplicate
//! removal is the most important invariant here.

use std::collections::{HashMap, HashSet};

use crate::config::PipelineConfig;
use crate::constants::DUPLICATE_CONFIDENCE;
use crate::domain::{Candidate, CandidateId, DecisionReason, Sector, Unit, ValidationDecision};

/// Grouping key: (value, unit, year), optionally widened with the sector.
/// The f64 value is keyed by its bit pattern with -0.0 folded into 0.0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    value_bits: u64,
    unit: Unit,
    year: Option<i32>,
    sector: Option<Sector>,
}

impl DedupKey {
    fn for_candidate(candidate: &Candidate, include_sector: bool) -> Self {
        let value = if candidate.value == 0.0 { 0.0 } else { candidate.value };
        Self {
            value_bits: value.to_bits(),
            unit: candidate.unit,
            year: candidate.year,
            sector: include_sector.then_some(candidate.sector),
        }
    }
}

/// Transient duplicate group: members ordered by ascending position; the
/// first member is the keep-candidate.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub key: DedupKey,
    pub members: Vec<CandidateId>,
}

pub struct Deduplicator {
    include_sector: bool,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            include_sector: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            include_sector: config.dedup_include_sector,
        }
    }

    /// Partition the surviving decisions into duplicate groups. Removed
    /// decisions are never grouped.
    pub fn groups(&self, decisions: &[ValidationDecision]) -> Vec<DuplicateGroup> {
        let mut order: Vec<DedupKey> = Vec::new();
        let mut by_key: HashMap<DedupKey, Vec<&Candidate>> = HashMap::new();

        for decision in decisions.iter().filter(|d| d.survives()) {
            let key = DedupKey::for_candidate(&decision.candidate, self.include_sector);
            let entry = by_key.entry(key.clone()).or_default();
            if entry.is_empty() {
                order.push(key);
            }
            entry.push(&decision.candidate);
        }

        order
            .into_iter()
            .map(|key| {
                let mut members = by_key.remove(&key).unwrap_or_default();
                members.sort_by_key(|c| c.position);
                DuplicateGroup {
                    key,
                    members: members.into_iter().map(|c| c.id()).collect(),
                }
            })
            .collect()
    }

    /// Rewrite each group's non-first members into duplicate removals that
    /// point at the surviving member. Size-1 groups pass through unchanged.
    pub fn dedup(&self, mut decisions: Vec<ValidationDecision>) -> Vec<ValidationDecision> {
        let groups = self.groups(&decisions);

        let mut keeper_of: HashMap<CandidateId, CandidateId> = HashMap::new();
        for group in &groups {
            let keeper = group.members[0].clone();
            for member in group.members.iter().skip(1) {
                keeper_of.insert(member.clone(), keeper.clone());
            }
        }

        for decision in decisions.iter_mut() {
            if let Some(keeper) = keeper_of.get(&decision.candidate_id()) {
                let mut removal = ValidationDecision::remove(
                    decision.candidate.clone(),
                    DecisionReason::Duplicate,
                    DUPLICATE_CONFIDENCE,
                );
                removal.kept_record_id = Some(keeper.clone());
                *decision = removal;
            }
        }

        decisions
    }

    /// DuplicateConflict repair: when previously kept group leaders are
    /// invalidated after dedup (e.g. by a human review rejection), re-run
    /// dedup on each reduced group so no removal points at an invalidated
    /// record.
    pub fn rededup_after_invalidation(
        &self,
        mut decisions: Vec<ValidationDecision>,
        invalidated: &HashSet<CandidateId>,
    ) -> Vec<ValidationDecision> {
        // Collect the orphaned duplicates per invalidated keeper.
        let mut orphans: HashMap<CandidateId, Vec<(usize, CandidateId, usize)>> = HashMap::new();
        for (index, decision) in decisions.iter().enumerate() {
            if decision.reason != DecisionReason::Duplicate {
                continue;
            }
            let Some(keeper) = &decision.kept_record_id else { continue };
            if invalidated.contains(keeper) {
                orphans.entry(keeper.clone()).or_default().push((
                    index,
                    decision.candidate_id(),
                    decision.candidate.position,
                ));
            }
        }

        for (_, mut members) in orphans {
            members.sort_by_key(|&(_, _, position)| position);
            let (promoted_index, promoted_id, _) = members[0].clone();

            let promoted_candidate = decisions[promoted_index].candidate.clone();
            let confidence = promoted_candidate.confidence;
            decisions[promoted_index] =
                ValidationDecision::keep(promoted_candidate, DecisionReason::SchemaValid, confidence);

            for (index, _, _) in members.into_iter().skip(1) {
                let mut removal = ValidationDecision::remove(
                    decisions[index].candidate.clone(),
                    DecisionReason::Duplicate,
                    DUPLICATE_CONFIDENCE,
                );
                removal.kept_record_id = Some(promoted_id.clone());
                decisions[index] = removal;
            }
        }

        decisions
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DecisionAction, MetricType};

    fn keep_at(position: usize, value: f64, sector: Sector) -> ValidationDecision {
        let candidate = Candidate {
            value,
            unit: Unit::Percentage,
            year: Some(2024),
            metric_type: MetricType::AdoptionRate,
            sector,
            context: "adoption context".to_string(),
            source_id: "r.pdf".to_string(),
            page: 1,
            position,
            glued_to_term: false,
            confidence: 0.7,
        };
        ValidationDecision::keep(candidate, DecisionReason::SchemaValid, 0.7)
    }

    #[test]
    fn test_first_by_position_is_kept_and_link_recorded() {
        let dedup = Deduplicator::new();
        let decisions = dedup.dedup(vec![
            keep_at(340, 75.5, Sector::Unknown),
            keep_at(12, 75.5, Sector::Unknown),
        ]);

        let kept: Vec<_> = decisions.iter().filter(|d| !d.is_removed()).collect();
        let removed: Vec<_> = decisions.iter().filter(|d| d.is_removed()).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(removed.len(), 1);
        assert_eq!(kept[0].candidate.position, 12);
        assert_eq!(removed[0].reason, DecisionReason::Duplicate);
        assert_eq!(removed[0].confidence, 0.90);
        assert_eq!(
            removed[0].kept_record_id.as_ref().unwrap(),
            &kept[0].candidate_id()
        );
    }

    #[test]
    fn test_singleton_groups_pass_through() {
        let dedup = Deduplicator::new();
        let decisions = dedup.dedup(vec![
            keep_at(10, 10.0, Sector::Unknown),
            keep_at(20, 20.0, Sector::Unknown),
        ]);
        assert!(decisions.iter().all(|d| d.action == DecisionAction::Keep));
        assert!(decisions.iter().all(|d| d.kept_record_id.is_none()));
    }

    #[test]
    fn test_removed_decisions_are_not_grouped() {
        let dedup = Deduplicator::new();
        let mut removed = keep_at(5, 75.5, Sector::Unknown);
        removed = ValidationDecision::remove(
            removed.candidate,
            DecisionReason::OutOfRange,
            0.9,
        );
        let decisions = dedup.dedup(vec![removed, keep_at(50, 75.5, Sector::Unknown)]);

        // the out-of-range removal at position 5 does not become the keeper
        let survivor = decisions.iter().find(|d| d.survives()).unwrap();
        assert_eq!(survivor.candidate.position, 50);
    }

    #[test]
    fn test_sector_widening_splits_groups() {
        let widened = Deduplicator {
            include_sector: true,
        };
        let decisions = widened.dedup(vec![
            keep_at(10, 75.5, Sector::Ict),
            keep_at(20, 75.5, Sector::Healthcare),
        ]);
        assert!(decisions.iter().all(|d| d.survives()));

        let base = Deduplicator::new();
        let decisions = base.dedup(vec![
            keep_at(10, 75.5, Sector::Ict),
            keep_at(20, 75.5, Sector::Healthcare),
        ]);
        assert_eq!(decisions.iter().filter(|d| d.is_removed()).count(), 1);
    }

    #[test]
    fn test_duplicate_invariant_holds_per_group() {
        let dedup = Deduplicator::new();
        let decisions = dedup.dedup(vec![
            keep_at(10, 75.5, Sector::Unknown),
            keep_at(20, 75.5, Sector::Unknown),
            keep_at(30, 75.5, Sector::Unknown),
        ]);

        let keeper: Vec<_> = decisions.iter().filter(|d| d.survives()).collect();
        assert_eq!(keeper.len(), 1);
        let keeper_id = keeper[0].candidate_id();
        for removal in decisions.iter().filter(|d| d.is_removed()) {
            assert_eq!(removal.kept_record_id.as_ref().unwrap(), &keeper_id);
        }
    }

    #[test]
    fn test_rededup_promotes_next_in_document_order() {
        let dedup = Deduplicator::new();
        let mut decisions = dedup.dedup(vec![
            keep_at(10, 75.5, Sector::Unknown),
            keep_at(20, 75.5, Sector::Unknown),
            keep_at(30, 75.5, Sector::Unknown),
        ]);

        // the original keeper is invalidated (review rejection)
        let keeper_id = decisions
            .iter()
            .find(|d| d.survives())
            .unwrap()
            .candidate_id();
        for decision in decisions.iter_mut() {
            if decision.candidate_id() == keeper_id {
                *decision = ValidationDecision::remove(
                    decision.candidate.clone(),
                    DecisionReason::ReviewRejected,
                    1.0,
                );
            }
        }

        let invalidated: HashSet<CandidateId> = [keeper_id].into_iter().collect();
        let repaired = dedup.rededup_after_invalidation(decisions, &invalidated);

        let new_keeper: Vec<_> = repaired.iter().filter(|d| d.survives()).collect();
        assert_eq!(new_keeper.len(), 1);
        assert_eq!(new_keeper[0].candidate.position, 20);

        let still_dup = repaired
            .iter()
            .find(|d| d.candidate.position == 30)
            .unwrap();
        assert_eq!(
            still_dup.kept_record_id.as_ref().unwrap(),
            &new_keeper[0].candidate_id()
        );
        // no removal points at the invalidated record any more
        for d in repaired.iter().filter(|d| d.reason == DecisionReason::Duplicate) {
            assert!(!invalidated.contains(d.kept_record_id.as_ref().unwrap()));
        }
    }
}
