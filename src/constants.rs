//! Named rule-strength constants so the weight of each cleanup rule is
//! auditable and testable independently of control flow.

// Classifier confidence by match specificity
pub const PHRASE_MATCH_CONFIDENCE: f64 = 0.9;
pub const KEYWORD_MATCH_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_CLASSIFICATION_CONFIDENCE: f64 = 0.5;

// Schema validator rule severities
pub const HARD_RULE_CONFIDENCE: f64 = 0.9;
pub const SOFT_CONTEXT_CONFIDENCE: f64 = 0.6;

// Anomaly detectors
pub const CITATION_YEAR_CONFIDENCE: f64 = 0.95;
pub const COMPOUND_TERM_CONFIDENCE: f64 = 0.85;
pub const MEANINGFUL_ZERO_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_ZERO_KEEP_CONFIDENCE: f64 = 0.5;
pub const LOW_INFORMATION_CONFIDENCE: f64 = 0.6;

// Deduplication
pub const DUPLICATE_CONFIDENCE: f64 = 0.90;

// Extraction windows (characters)
pub const CONTEXT_WINDOW_CHARS: usize = 150;
pub const YEAR_ADJACENCY_CHARS: usize = 60;

// Operator-facing threshold alarm defaults (overridable via config.toml)
pub const MAX_REMOVAL_RATE: f64 = 0.90;
pub const MIN_QUALITY_SCORE: f64 = 0.10;
pub const MAX_ZERO_VALUE_FRACTION: f64 = 0.50;
