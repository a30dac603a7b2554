use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use econ_extractor::app::cleanup_use_case::CleanupUseCase;
use econ_extractor::app::ports::{MetricStorePort, QualityHistoryPort};
use econ_extractor::config::PipelineConfig;
use econ_extractor::infra::fs_document_source::FsDocumentSource;
use econ_extractor::infra::history_log::QualityHistoryLog;
use econ_extractor::infra::memory_store::InMemoryMetricStore;
use econ_extractor::infra::sqlite_store::SqliteMetricStore;
use econ_extractor::logging;
use econ_extractor::review;

#[derive(Parser)]
#[command(name = "econ_extractor")]
#[command(about = "Economic metrics extraction and cleaning pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, clean and persist metrics for one or more sources
    Run {
        /// Source document ids (comma-separated), resolved under --input-dir
        #[arg(long)]
        sources: String,
        /// Directory the document backend reads from
        #[arg(long, default_value = "documents")]
        input_dir: PathBuf,
        /// Keep results in memory instead of the SQLite store
        #[arg(long)]
        in_memory: bool,
        /// Acknowledge outstanding threshold alarms before a destructive overwrite
        #[arg(long)]
        acknowledge_alarms: bool,
        /// Optional reviewer verdicts (JSON) merged before persistence
        #[arg(long)]
        review_file: Option<PathBuf>,
    },
    /// Show the latest quality record for a source
    History {
        #[arg(long)]
        source: String,
    },
    /// Show the chronological quality trend for a source
    Trend {
        #[arg(long)]
        source: String,
    },
    /// Show aggregate quality statistics across all sources
    Aggregate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = PipelineConfig::load()?;
    logging::init_logging(&config.log_dir);

    match cli.command {
        Commands::Run {
            sources,
            input_dir,
            in_memory,
            acknowledge_alarms,
            review_file,
        } => {
            let source_ids: Vec<String> = sources
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            let documents = Arc::new(FsDocumentSource::new(input_dir));
            let store: Arc<dyn MetricStorePort> = if in_memory {
                Arc::new(InMemoryMetricStore::new())
            } else {
                Arc::new(SqliteMetricStore::open(&config.store_path)?)
            };
            let history: Arc<dyn QualityHistoryPort> =
                Arc::new(QualityHistoryLog::new(&config.history_path));

            let reviews = match &review_file {
                Some(path) => review::load_review_file(path)?,
                None => Vec::new(),
            };

            let use_case = CleanupUseCase::new(
                &config,
                documents,
                store.clone(),
                history,
                acknowledge_alarms,
            );

            println!("🔄 Running cleanup pipeline...");
            for source_id in &source_ids {
                let span = tracing::info_span!("Cleaning source", source = %source_id);
                let _enter = span.enter();

                match use_case.clean_source(source_id).await {
                    Ok(mut outcome) => {
                        if !reviews.is_empty() {
                            let pages_skipped = outcome.pages_skipped;
                            let checksum = outcome.record.checksum.clone();
                            match use_case
                                .apply_reviews(source_id, outcome.decisions, &reviews, checksum)
                                .await
                            {
                                Ok(mut merged) => {
                                    merged.pages_skipped = pages_skipped;
                                    info!("Applied {} reviewer verdict(s)", reviews.len());
                                    outcome = merged;
                                }
                                Err(e) => {
                                    error!("Review merge failed: {}", e);
                                    println!("⚠️  Review merge failed for {}: {}", source_id, e);
                                    continue;
                                }
                            }
                        }

                        println!("\n📊 Cleanup results for {}:", source_id);
                        println!("   Candidates: {}", outcome.record.total);
                        println!("   Kept: {}", outcome.record.kept);
                        println!("   Removed: {}", outcome.record.removed);
                        println!("   Modified: {}", outcome.record.modified);
                        println!(
                            "   Quality score: {:.1}%",
                            outcome.record.quality_score * 100.0
                        );
                        if outcome.pages_skipped > 0 {
                            println!("   ⚠️  Pages skipped: {}", outcome.pages_skipped);
                        }
                        for alarm in &outcome.record.alarms {
                            println!("   ⚠️  Alarm: {}", alarm);
                        }
                    }
                    Err(e) => {
                        error!("Cleanup failed: {}", e);
                        println!("⚠️  Cleanup failed for {}: {}", source_id, e);
                    }
                }
            }
        }
        Commands::History { source } => {
            let history = QualityHistoryLog::new(&config.history_path);
            match history.latest(&source).await? {
                Some(record) => println!("{}", record),
                None => println!("No history for {}", source),
            }
        }
        Commands::Trend { source } => {
            let history = QualityHistoryLog::new(&config.history_path);
            let trend = history.trend(&source).await?;
            if trend.is_empty() {
                println!("No history for {}", source);
            }
            for record in trend {
                println!("{}", record);
            }
        }
        Commands::Aggregate => {
            let history = QualityHistoryLog::new(&config.history_path);
            let aggregate = history.aggregate().await?;
            println!("📈 Quality history across {} source(s):", aggregate.sources);
            println!("   Runs: {}", aggregate.runs);
            println!("   Candidates: {}", aggregate.total_candidates);
            println!("   Kept: {}", aggregate.total_kept);
            println!("   Removed: {}", aggregate.total_removed);
            println!(
                "   Mean quality score: {:.1}%",
                aggregate.mean_quality_score * 100.0
            );
        }
    }

    Ok(())
}
