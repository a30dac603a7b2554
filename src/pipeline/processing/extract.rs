//! Candidate extraction: regex scan of segmented page text for numeric
//! patterns with surrounding context. No validation happens here; false
//! positives are expected and filtered downstream.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PipelineConfig;
use crate::constants::{
    CONTEXT_WINDOW_CHARS, DEFAULT_CLASSIFICATION_CONFIDENCE, YEAR_ADJACENCY_CHARS,
};
use crate::domain::{Candidate, MetricType, PageRecord, Sector, Unit};
use crate::error::{PipelineError, Result};

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").unwrap());
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$\s*(\d+(?:\.\d+)?)\s*(billion|million|trillion)").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Result of extracting one document: candidates in document order plus the
/// per-page failures that were skipped.
#[derive(Debug, Default)]
pub struct DocumentExtraction {
    pub candidates: Vec<Candidate>,
    pub page_errors: Vec<PipelineError>,
    pub pages_processed: usize,
}

/// Pure extractor over segmented page text.
pub struct Extractor {
    context_window: usize,
    year_adjacency: usize,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            context_window: CONTEXT_WINDOW_CHARS,
            year_adjacency: YEAR_ADJACENCY_CHARS,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            context_window: config.context_window_chars,
            year_adjacency: config.year_adjacency_chars,
        }
    }

    /// Extract candidates from every page of a document. A page that cannot
    /// be decoded is recorded as an error and skipped; the rest of the
    /// document still processes. Positions stay document-global so ordering
    /// is stable across restarts.
    pub fn extract_document(&self, source_id: &str, pages: &[PageRecord]) -> DocumentExtraction {
        let mut out = DocumentExtraction::default();
        let mut base_offset = 0usize;

        for page in pages {
            match self.extract_page(source_id, page, base_offset) {
                Ok(mut candidates) => {
                    out.candidates.append(&mut candidates);
                    out.pages_processed += 1;
                }
                Err(e) => out.page_errors.push(e),
            }
            base_offset += page.content.len() + 1;
        }

        out.candidates.sort_by_key(|c| c.position);
        out
    }

    /// Extract candidates from one page. Pure function of the page text.
    pub fn extract_page(
        &self,
        source_id: &str,
        page: &PageRecord,
        base_offset: usize,
    ) -> Result<Vec<Candidate>> {
        let text = std::str::from_utf8(&page.content).map_err(|e| PipelineError::Extraction {
            page: page.page_number,
            detail: e.to_string(),
        })?;

        let mut candidates = Vec::new();
        let mut covered: Vec<(usize, usize)> = Vec::new();

        // Family 1: percentages.
        for caps in PERCENT_RE.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let Ok(value) = caps[1].parse::<f64>() else { continue };
            covered.push((m.start(), m.end()));
            candidates.push(self.candidate(
                source_id,
                page,
                text,
                base_offset,
                m.start(),
                m.end(),
                value,
                Unit::Percentage,
            ));
        }

        // Family 2: currency with scale word.
        for caps in CURRENCY_RE.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let Ok(value) = caps[1].parse::<f64>() else { continue };
            let unit = match caps[2].to_lowercase().as_str() {
                "million" => Unit::CurrencyMillion,
                "billion" => Unit::CurrencyBillion,
                _ => Unit::CurrencyTrillion,
            };
            covered.push((m.start(), m.end()));
            candidates.push(self.candidate(
                source_id,
                page,
                text,
                base_offset,
                m.start(),
                m.end(),
                value,
                unit,
            ));
        }

        // Family 3: bare numbers adjacent to a year token. Spans already
        // claimed by an earlier family are not re-matched.
        for m in NUMBER_RE.find_iter(text) {
            if covered.iter().any(|&(s, e)| m.start() < e && m.end() > s) {
                continue;
            }
            if self.nearest_year(text, m.start(), m.end()).is_none() {
                continue;
            }
            let Ok(value) = m.as_str().parse::<f64>() else { continue };
            candidates.push(self.candidate(
                source_id,
                page,
                text,
                base_offset,
                m.start(),
                m.end(),
                value,
                Unit::Count,
            ));
        }

        Ok(candidates)
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate(
        &self,
        source_id: &str,
        page: &PageRecord,
        text: &str,
        base_offset: usize,
        start: usize,
        end: usize,
        value: f64,
        unit: Unit,
    ) -> Candidate {
        Candidate {
            value,
            unit,
            year: self.nearest_year(text, start, end),
            metric_type: MetricType::Unknown,
            sector: Sector::Unknown,
            context: self.context_window_text(text, start, end),
            source_id: source_id.to_string(),
            page: page.page_number,
            position: base_offset + start,
            glued_to_term: glued_to_term(text, start),
            confidence: DEFAULT_CLASSIFICATION_CONFIDENCE,
        }
    }

    /// Nearest 19xx/20xx token within the adjacency window, if any. A number
    /// that is itself a year token is its own nearest year.
    fn nearest_year(&self, text: &str, start: usize, end: usize) -> Option<i32> {
        let win_start = floor_boundary(text, start.saturating_sub(self.year_adjacency));
        let win_end = ceil_boundary(text, (end + self.year_adjacency).min(text.len()));
        let window = &text[win_start..win_end];

        let mut best: Option<(usize, i32)> = None;
        for m in YEAR_RE.find_iter(window) {
            let abs_start = win_start + m.start();
            let distance = if abs_start >= start {
                abs_start - start
            } else {
                start - abs_start
            };
            let year: i32 = match m.as_str().parse() {
                Ok(y) => y,
                Err(_) => continue,
            };
            match best {
                Some((d, _)) if d <= distance => {}
                _ => best = Some((distance, year)),
            }
        }
        best.map(|(_, year)| year)
    }

    /// Whitespace-normalized context spanning at least the configured window
    /// on each side of the match.
    fn context_window_text(&self, text: &str, start: usize, end: usize) -> String {
        let ctx_start = floor_boundary(text, start.saturating_sub(self.context_window));
        let ctx_end = ceil_boundary(text, (end + self.context_window).min(text.len()));
        normalize_whitespace(&text[ctx_start..ctx_end])
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the match at `start` directly follows `<word>-` with no
/// intervening whitespace, as in the 19 of "COVID-19".
fn glued_to_term(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev();
    if before.next() != Some('-') {
        return false;
    }
    before.take_while(|c| c.is_ascii_alphabetic()).count() >= 2
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
