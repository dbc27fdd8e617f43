//! Summary header shared by index and source pages

use crate::classify::{classify, coverage_ratio, format_percent, CoverageClass, Thresholds};
use crate::plan::{targets, DisplayWrite};
use serde::{Deserialize, Serialize};

/// Title prefix of every report page
pub const TITLE_PREFIX: &str = "Coverage report - ";

/// Run summary supplied by the producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Invocation that produced the coverage run
    pub command: String,
    /// Run timestamp, already formatted by the producer
    pub date: String,
    pub covered: u64,
    pub instrumented: u64,
}

/// Display values derived from a header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderView {
    pub percent_text: String,
    pub percent_class: CoverageClass,
    pub title: String,
    pub command: String,
    pub date: String,
    pub covered: String,
    pub instrumented: String,
}

impl HeaderView {
    pub fn new(header: &Header, thresholds: &Thresholds) -> Self {
        HeaderView {
            percent_text: format_percent(coverage_ratio(header.covered, header.instrumented)),
            percent_class: classify(header.covered, header.instrumented, thresholds),
            title: format!("{}{}", TITLE_PREFIX, header.command),
            command: header.command.clone(),
            date: header.date.clone(),
            covered: header.covered.to_string(),
            instrumented: header.instrumented.to_string(),
        }
    }

    /// Writes in application order
    pub fn writes(&self) -> Vec<DisplayWrite> {
        vec![
            DisplayWrite::class(targets::PERCENT_COVERED, self.percent_class.css_class()),
            DisplayWrite::text(targets::PERCENT_COVERED, &self.percent_text),
            DisplayWrite::text(targets::COMMAND, &self.command),
            DisplayWrite::text(targets::WINDOW_TITLE, &self.title),
            DisplayWrite::text(targets::DATE, &self.date),
            DisplayWrite::text(targets::COVERED, &self.covered),
            DisplayWrite::text(targets::INSTRUMENTED, &self.instrumented),
        ]
    }
}
