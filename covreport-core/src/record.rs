//! Coverage records and datasets
//!
//! Records are opaque to the renderers: they are handed to the template
//! collaborator as-is. `IndexEntry` and `SourceLine` build records in the
//! shape the kcov HTML writer produces.

use crate::classify::{coverage_ratio, Thresholds};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of structured coverage data, passed through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageRecord(Map<String, Value>);

impl CoverageRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Field rendered as display text: strings verbatim, other scalars as
    /// their JSON text, null and missing fields as empty.
    pub fn field_text(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Which slot a dataset feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    /// Per-file summary rows of the index page
    Main,
    /// Independently aggregated summary rows of the index page
    Merged,
    /// Per-line rows of a source page
    Source,
}

impl DatasetRole {
    /// Template slot the dataset is bound to
    pub fn slot(&self) -> &'static str {
        match self {
            DatasetRole::Main => "main-data",
            DatasetRole::Merged => "merged-data",
            DatasetRole::Source => "source-code",
        }
    }
}

/// Ordered records with a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub role: DatasetRole,
    pub records: Vec<CoverageRecord>,
}

impl Dataset {
    pub fn new(role: DatasetRole, records: Vec<CoverageRecord>) -> Self {
        Dataset { role, records }
    }

    pub fn empty(role: DatasetRole) -> Self {
        Dataset::new(role, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Row class for an index entry.
///
/// Stricter than the header classifier: the low limit itself is already
/// `linePartCov` only when exceeded.
pub fn row_class(percent: f64, thresholds: &Thresholds) -> &'static str {
    if percent >= thresholds.percent_high {
        "lineCov"
    } else if percent > thresholds.percent_low {
        "linePartCov"
    } else {
        "lineNoCov"
    }
}

/// Summary of one file (or one merged run) on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub link: String,
    pub title: String,
    pub summary_name: String,
    pub covered_lines: u64,
    pub total_lines: u64,
}

impl IndexEntry {
    pub fn percent(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            coverage_ratio(self.covered_lines, self.total_lines)
        }
    }

    pub fn to_record(&self, thresholds: &Thresholds) -> CoverageRecord {
        let percent = self.percent();
        let mut record = CoverageRecord::new();
        record.insert("link", self.link.clone());
        record.insert("title", self.title.clone());
        record.insert("summary_name", self.summary_name.clone());
        record.insert("covered_class", row_class(percent, thresholds));
        record.insert("covered", format!("{:.1}", percent));
        record.insert("covered_lines", self.covered_lines.to_string());
        record.insert(
            "uncovered_lines",
            self.total_lines
                .saturating_sub(self.covered_lines)
                .to_string(),
        );
        record.insert("total_lines", self.total_lines.to_string());
        record
    }
}

/// Execution counts of a code line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHits {
    pub hits: u32,
    /// Known only when the producer tracks several addresses per line
    pub possible_hits: Option<u32>,
}

impl LineHits {
    pub fn class(&self) -> &'static str {
        match self.possible_hits {
            None => {
                if self.hits > 0 {
                    "lineCov"
                } else {
                    "lineNoCov"
                }
            }
            Some(possible) => {
                if self.hits == possible {
                    "lineCov"
                } else if self.hits > 0 {
                    "linePartCov"
                } else {
                    "lineNoCov"
                }
            }
        }
    }
}

/// One line of an annotated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line_num: u32,
    pub line: String,
    /// `None` for lines with no code
    pub hits: Option<LineHits>,
}

impl SourceLine {
    pub fn to_record(&self) -> CoverageRecord {
        let mut record = CoverageRecord::new();
        record.insert("lineNum", format!("{:>5}", self.line_num));
        record.insert("line", self.line.clone());
        if let Some(hits) = self.hits {
            record.insert("class", hits.class());
            record.insert("hits", hits.hits.to_string());
            if let Some(possible) = hits.possible_hits {
                record.insert("possible_hits", possible.to_string());
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text() {
        let record: CoverageRecord = serde_json::from_str(
            r#"{"s": "text", "n": 12, "f": 1.5, "b": true, "z": null}"#,
        )
        .unwrap();
        assert_eq!(record.field_text("s"), "text");
        assert_eq!(record.field_text("n"), "12");
        assert_eq!(record.field_text("f"), "1.5");
        assert_eq!(record.field_text("b"), "true");
        assert_eq!(record.field_text("z"), "");
        assert_eq!(record.field_text("missing"), "");
    }

    #[test]
    fn test_record_rejects_non_object() {
        let result: Result<CoverageRecord, _> = serde_json::from_str("[1, 2]");
        assert!(result.is_err());
    }

    #[test]
    fn test_record_passthrough_round_trip() {
        let json = r#"{"anything":{"nested":[1,2,3]},"title":"x"}"#;
        let record: CoverageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }

    #[test]
    fn test_role_slots() {
        assert_eq!(DatasetRole::Main.slot(), "main-data");
        assert_eq!(DatasetRole::Merged.slot(), "merged-data");
        assert_eq!(DatasetRole::Source.slot(), "source-code");
    }

    #[test]
    fn test_row_class_boundaries() {
        let th = Thresholds::default();
        assert_eq!(row_class(75.0, &th), "lineCov");
        assert_eq!(row_class(74.9, &th), "linePartCov");
        assert_eq!(row_class(25.1, &th), "linePartCov");
        assert_eq!(row_class(25.0, &th), "lineNoCov");
        assert_eq!(row_class(0.0, &th), "lineNoCov");
    }

    #[test]
    fn test_index_entry_record() {
        let entry = IndexEntry {
            link: "main.c.1a2b.html".to_string(),
            title: "main.c".to_string(),
            summary_name: "[...]/src/main.c".to_string(),
            covered_lines: 1,
            total_lines: 3,
        };
        let record = entry.to_record(&Thresholds::default());
        assert_eq!(record.field_text("covered"), "33.3");
        assert_eq!(record.field_text("covered_class"), "linePartCov");
        assert_eq!(record.field_text("covered_lines"), "1");
        assert_eq!(record.field_text("uncovered_lines"), "2");
        assert_eq!(record.field_text("total_lines"), "3");
        assert_eq!(record.field_text("summary_name"), "[...]/src/main.c");
    }

    #[test]
    fn test_index_entry_without_lines() {
        let entry = IndexEntry {
            link: "empty.html".to_string(),
            title: "empty.c".to_string(),
            summary_name: "empty.c".to_string(),
            covered_lines: 0,
            total_lines: 0,
        };
        let record = entry.to_record(&Thresholds::default());
        assert_eq!(record.field_text("covered"), "0.0");
        assert_eq!(record.field_text("covered_class"), "lineNoCov");
    }

    #[test]
    fn test_source_line_records() {
        let plain = SourceLine {
            line_num: 7,
            line: "// comment".to_string(),
            hits: None,
        };
        let record = plain.to_record();
        assert_eq!(record.field_text("lineNum"), "    7");
        assert!(record.get("class").is_none());

        let partial = SourceLine {
            line_num: 12,
            line: "if (x) y();".to_string(),
            hits: Some(LineHits {
                hits: 1,
                possible_hits: Some(2),
            }),
        };
        let record = partial.to_record();
        assert_eq!(record.field_text("class"), "linePartCov");
        assert_eq!(record.field_text("hits"), "1");
        assert_eq!(record.field_text("possible_hits"), "2");
    }

    #[test]
    fn test_line_hits_classes() {
        let single = |hits| LineHits {
            hits,
            possible_hits: None,
        };
        assert_eq!(single(0).class(), "lineNoCov");
        assert_eq!(single(4).class(), "lineCov");

        let multi = |hits| LineHits {
            hits,
            possible_hits: Some(3),
        };
        assert_eq!(multi(0).class(), "lineNoCov");
        assert_eq!(multi(2).class(), "linePartCov");
        assert_eq!(multi(3).class(), "lineCov");
    }
}
