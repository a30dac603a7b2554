use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use econ_extractor::app::cleanup_use_case::CleanupUseCase;
use econ_extractor::app::ports::{MetricStorePort, QualityHistoryPort};
use econ_extractor::config::PipelineConfig;
use econ_extractor::domain::{
    DecisionAction, DecisionReason, MetricType, Sector, Unit, ValidationDecision,
};
use econ_extractor::infra::fs_document_source::FsDocumentSource;
use econ_extractor::infra::history_log::QualityHistoryLog;
use econ_extractor::infra::memory_store::InMemoryMetricStore;
use econ_extractor::infra::sqlite_store::SqliteMetricStore;

fn write_document(dir: &std::path::Path, name: &str, text: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    write!(file, "{}", text).unwrap();
}

fn pipeline(
    input_dir: &std::path::Path,
    history_path: &std::path::Path,
) -> (CleanupUseCase, Arc<InMemoryMetricStore>, Arc<QualityHistoryLog>) {
    let store = Arc::new(InMemoryMetricStore::new());
    let history = Arc::new(QualityHistoryLog::new(history_path));
    let use_case = CleanupUseCase::new(
        &PipelineConfig::default(),
        Arc::new(FsDocumentSource::new(input_dir)),
        store.clone(),
        history.clone(),
        false,
    );
    (use_case, store, history)
}

#[tokio::test]
async fn test_duplicate_invariant_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    // The same figure repeated in prose and in a summary paragraph.
    let text = "The survey reported an adoption rate of 75.5% in 2024 among firms. \
                Later sections revisit the same finding, noting once more that adoption \
                stood at 75.5% in 2024 across the studied population of enterprises.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let dups: Vec<&ValidationDecision> = outcome
        .decisions
        .iter()
        .filter(|d| d.reason == DecisionReason::Duplicate)
        .collect();
    assert!(!dups.is_empty(), "expected a duplicate removal");

    // every duplicate removal resolves to a keep decision in the same run
    let keeps: HashMap<_, _> = outcome
        .decisions
        .iter()
        .filter(|d| d.survives())
        .map(|d| (d.candidate_id(), d))
        .collect();
    for dup in &dups {
        let keeper_id = dup.kept_record_id.as_ref().expect("traceability link");
        let keeper = keeps.get(keeper_id).expect("keeper survives in same run");
        // first by document order
        assert!(keeper.candidate.position < dup.candidate.position);
    }
}

#[tokio::test]
async fn test_kept_record_id_matches_first_position() {
    let dir = tempfile::tempdir().unwrap();
    let text = "Adoption was 75.5% in 2024 for the adoption survey cohort. \
                Another passage repeats: adoption measured 75.5% in 2024 again.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let pct: Vec<&ValidationDecision> = outcome
        .decisions
        .iter()
        .filter(|d| d.candidate.value == 75.5 && d.candidate.unit == Unit::Percentage)
        .collect();
    assert_eq!(pct.len(), 2);

    let first = pct.iter().min_by_key(|d| d.candidate.position).unwrap();
    let second = pct.iter().max_by_key(|d| d.candidate.position).unwrap();
    assert_eq!(first.action, DecisionAction::Keep);
    assert_eq!(second.action, DecisionAction::Remove);
    assert_eq!(second.reason, DecisionReason::Duplicate);
    assert_eq!(second.confidence, 0.90);
    assert_eq!(second.kept_record_id.as_ref().unwrap(), &first.candidate_id());
}

#[tokio::test]
async fn test_citation_year_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let text = "Technology markets shifted, as shown in Smith (2024), with broad \
                implications for the policy debate of that period.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let citation = outcome
        .decisions
        .iter()
        .find(|d| d.candidate.value == 2024.0)
        .expect("citation year extracted");
    assert_eq!(citation.action, DecisionAction::Remove);
    assert_eq!(citation.reason, DecisionReason::CitationYear);
}

#[tokio::test]
async fn test_compound_term_digit_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let text = "COVID-19 disruptions spread through 2020 across most of the \
                surveyed manufacturing firms in the panel.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let nineteen = outcome
        .decisions
        .iter()
        .find(|d| d.candidate.value == 19.0)
        .expect("digit split out of COVID-19 extracted");
    assert_eq!(nineteen.action, DecisionAction::Remove);
    assert_eq!(nineteen.reason, DecisionReason::CompoundTerm);
}

#[tokio::test]
async fn test_value_coinciding_with_compound_digit_survives() {
    let dir = tempfile::tempdir().unwrap();
    // a real 19% figure in a paragraph that also mentions COVID-19
    let text = "After COVID-19 shutdowns spread in 2020, the survey found \
                adoption reached 19% among clinics in 2023.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let pct = outcome
        .decisions
        .iter()
        .find(|d| d.candidate.value == 19.0 && d.candidate.unit == Unit::Percentage)
        .expect("19% extracted");
    assert_eq!(pct.action, DecisionAction::Keep);
    assert_ne!(pct.reason, DecisionReason::CompoundTerm);

    // only the digit glued to COVID- may be flagged as a compound term
    for d in &outcome.decisions {
        if d.reason == DecisionReason::CompoundTerm {
            assert!(d.candidate.glued_to_term);
        }
    }
}

#[tokio::test]
async fn test_meaningful_zero_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let text = "Contrary to expectations, the study found 0% growth in Q3 2023 \
                for the participating firms in the panel.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let zero = outcome
        .decisions
        .iter()
        .find(|d| d.candidate.value == 0.0 && d.candidate.unit == Unit::Percentage)
        .expect("zero extracted");
    assert_ne!(zero.action, DecisionAction::Remove);
    assert_eq!(zero.reason, DecisionReason::MeaningfulZero);
}

#[tokio::test]
async fn test_ict_candidates_never_removed_by_generic_heuristics() {
    let dir = tempfile::tempdir().unwrap();
    let text = "National ICT infrastructure expanded with telecom towers and broadband \
                rollout; ICT adoption reached 42.0% in 2024 according to the survey.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    for decision in &outcome.decisions {
        if decision.candidate.sector == Sector::Ict && decision.is_removed() {
            assert!(
                !decision.reason.is_generic_heuristic(),
                "ICT candidate removed by generic heuristic: {:?}",
                decision.reason
            );
        }
    }
}

#[tokio::test]
async fn test_out_of_range_adoption_rate_removed() {
    let dir = tempfile::tempdir().unwrap();
    let text = "A transcription artifact claimed an adoption rate of 110% in 2024, \
                which no population can exceed.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();

    let overflow = outcome
        .decisions
        .iter()
        .find(|d| d.candidate.value == 110.0 && d.candidate.unit == Unit::Percentage)
        .expect("110% extracted");
    assert_eq!(overflow.candidate.metric_type, MetricType::AdoptionRate);
    assert_eq!(overflow.action, DecisionAction::Remove);
    assert_eq!(overflow.reason, DecisionReason::OutOfRange);
}

#[tokio::test]
async fn test_history_appends_across_runs_and_rows_persist() {
    let dir = tempfile::tempdir().unwrap();
    let text = "The adoption survey reported 55% uptake in 2024 among responding firms.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, store, history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    use_case.clean_source("report.txt").await.unwrap();
    use_case.clean_source("report.txt").await.unwrap();

    let trend = history.trend("report.txt").await.unwrap();
    assert_eq!(trend.len(), 2, "history is append-only across runs");

    let rows = store.rows_for_source("report.txt").await.unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().any(|r| r.action == "keep"));
}

#[tokio::test]
async fn test_sqlite_store_round_trip_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let text = "The adoption survey reported 55% uptake in 2024 among responding firms.";
    write_document(dir.path(), "report.txt", text);

    let store = Arc::new(SqliteMetricStore::open(dir.path().join("metrics.db")).unwrap());
    let history = Arc::new(QualityHistoryLog::new(dir.path().join("h.ndjson")));
    let use_case = CleanupUseCase::new(
        &PipelineConfig::default(),
        Arc::new(FsDocumentSource::new(dir.path())),
        store.clone(),
        history,
        false,
    );

    let outcome = use_case.clean_source("report.txt").await.unwrap();
    let rows = store.rows_for_source("report.txt").await.unwrap();
    assert_eq!(rows.len(), outcome.decisions.len());
}

#[tokio::test]
async fn test_revalidation_of_kept_candidates_is_idempotent() {
    use econ_extractor::pipeline::processing::validate::SchemaValidator;

    let dir = tempfile::tempdir().unwrap();
    let text = "The adoption survey reported 55% uptake in 2024 among responding firms.";
    write_document(dir.path(), "report.txt", text);
    let (use_case, _store, _history) = pipeline(dir.path(), &dir.path().join("h.ndjson"));

    let outcome = use_case.clean_source("report.txt").await.unwrap();
    let validator = SchemaValidator::new();

    for decision in outcome.decisions.iter().filter(|d| d.survives()) {
        let revalidated = validator.validate(&decision.candidate);
        assert_eq!(revalidated.action, DecisionAction::Keep);
    }
}
