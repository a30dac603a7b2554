//! Human review merge. An external review UI reads and writes the same
//! candidate+decision schema; verdicts recorded there are merged back into a
//! run's decisions before final persistence. Rejecting the keeper of a
//! duplicate group triggers a re-dedup of the reduced group so no removal is
//! left pointing at an invalidated record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::domain::{CandidateId, DecisionAction, DecisionReason, ValidationDecision};
use crate::error::Result;
use crate::pipeline::processing::dedup::Deduplicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Accept,
    Reject,
    Modify,
}

/// One reviewer verdict on one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub candidate_ref: CandidateId,
    pub verdict: ReviewVerdict,
    #[serde(default)]
    pub corrected_fields: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub note: Option<String>,
}

pub fn load_review_file(path: impl AsRef<Path>) -> Result<Vec<ReviewDecision>> {
    let content = std::fs::read_to_string(path)?;
    let decisions: Vec<ReviewDecision> = serde_json::from_str(&content)?;
    Ok(decisions)
}

/// Apply reviewer verdicts on top of a run's decisions. Review overrides the
/// automated verdict in both directions; a human accept resurrects even an
/// automated removal.
pub fn merge_reviews(
    decisions: Vec<ValidationDecision>,
    reviews: &[ReviewDecision],
    deduplicator: &Deduplicator,
) -> Vec<ValidationDecision> {
    let by_ref: HashMap<&CandidateId, &ReviewDecision> =
        reviews.iter().map(|r| (&r.candidate_ref, r)).collect();

    // Group keepers that review is about to invalidate.
    let keepers: HashSet<CandidateId> = decisions
        .iter()
        .filter_map(|d| d.kept_record_id.clone())
        .collect();
    let mut invalidated: HashSet<CandidateId> = HashSet::new();

    let mut merged = Vec::with_capacity(decisions.len());
    for decision in decisions {
        let id = decision.candidate_id();
        let Some(review) = by_ref.get(&id) else {
            merged.push(decision);
            continue;
        };

        let updated = match review.verdict {
            ReviewVerdict::Accept => {
                ValidationDecision::keep(decision.candidate, DecisionReason::ReviewAccepted, 1.0)
            }
            ReviewVerdict::Reject => {
                if keepers.contains(&id) {
                    invalidated.insert(id.clone());
                }
                ValidationDecision::remove(decision.candidate, DecisionReason::ReviewRejected, 1.0)
            }
            ReviewVerdict::Modify => ValidationDecision {
                candidate: decision.candidate,
                action: DecisionAction::Modify,
                reason: DecisionReason::ReviewModified,
                confidence: 1.0,
                needs_review: false,
                corrected_fields: review.corrected_fields.clone(),
                kept_record_id: None,
            },
        };
        merged.push(updated);
    }

    if invalidated.is_empty() {
        merged
    } else {
        deduplicator.rededup_after_invalidation(merged, &invalidated)
    }
}
