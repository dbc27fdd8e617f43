//! Page data and the explicit render contexts built from it
//!
//! `PageData` mirrors what the producer supplies for one page, with every
//! item optional. Building an `IndexContext` or `SourceContext` checks that
//! the items the page needs are present.

use crate::classify::Thresholds;
use crate::error::RenderError;
use crate::header::Header;
use crate::record::{CoverageRecord, Dataset, DatasetRole};
use crate::script;
use crate::sort::SortIntent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw page data, as supplied by the producer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(default)]
    pub header: Option<Header>,
    #[serde(default)]
    pub data: Option<Vec<CoverageRecord>>,
    #[serde(default)]
    pub merged_data: Option<Vec<CoverageRecord>>,
    #[serde(default)]
    pub percent_low: Option<f64>,
    #[serde(default)]
    pub percent_high: Option<f64>,
}

/// Everything the index renderer reads
#[derive(Debug, Clone, PartialEq)]
pub struct IndexContext {
    pub header: Header,
    pub main: Dataset,
    pub merged: Dataset,
    pub thresholds: Thresholds,
    pub sort: SortIntent,
}

/// Everything the source renderer reads
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContext {
    pub header: Header,
    pub source: Dataset,
    pub thresholds: Thresholds,
}

impl PageData {
    /// Parse a producer data script (`var data = [...]; ...`)
    pub fn from_script(src: &str) -> Result<Self> {
        let mut page = PageData::default();
        for (name, value) in script::parse_assignments(src)? {
            match name.as_str() {
                "header" => {
                    page.header =
                        Some(serde_json::from_value(value).context("invalid `header` value")?);
                }
                "data" => {
                    page.data =
                        Some(serde_json::from_value(value).context("invalid `data` value")?);
                }
                "merged_data" => {
                    page.merged_data = Some(
                        serde_json::from_value(value).context("invalid `merged_data` value")?,
                    );
                }
                "percent_low" => page.percent_low = Some(number(&name, &value)?),
                "percent_high" => page.percent_high = Some(number(&name, &value)?),
                _ => tracing::debug!("ignoring unknown page variable `{}`", name),
            }
        }
        Ok(page)
    }

    /// Parse a JSON page document
    pub fn from_json(src: &str) -> Result<Self> {
        serde_json::from_str(src).context("invalid page data JSON")
    }

    /// Parse either encoding, deciding by the first token
    pub fn parse(src: &str) -> Result<Self> {
        if script::looks_like_script(src) {
            PageData::from_script(src)
        } else {
            PageData::from_json(src)
        }
    }

    /// Replace the page's thresholds (CLI or config override)
    pub fn override_thresholds(&mut self, thresholds: Thresholds) {
        self.percent_low = Some(thresholds.percent_low);
        self.percent_high = Some(thresholds.percent_high);
    }

    fn header(&self) -> Result<Header, RenderError> {
        self.header
            .clone()
            .ok_or(RenderError::MissingGlobalData { name: "header" })
    }

    fn data(&self) -> Result<Vec<CoverageRecord>, RenderError> {
        self.data
            .clone()
            .ok_or(RenderError::MissingGlobalData { name: "data" })
    }

    fn thresholds(&self) -> Result<Thresholds, RenderError> {
        let percent_low = self
            .percent_low
            .ok_or(RenderError::MissingGlobalData { name: "percent_low" })?;
        let percent_high = self
            .percent_high
            .ok_or(RenderError::MissingGlobalData {
                name: "percent_high",
            })?;
        Ok(Thresholds {
            percent_low,
            percent_high,
        })
    }

    /// Build the index context; `data` becomes the `main` dataset
    pub fn index_context(&self, sort: SortIntent) -> Result<IndexContext, RenderError> {
        let header = self.header()?;
        let main = Dataset::new(DatasetRole::Main, self.data()?);
        let merged = self
            .merged_data
            .clone()
            .ok_or(RenderError::MissingGlobalData {
                name: "merged_data",
            })?;
        let thresholds = self.thresholds()?;
        Ok(IndexContext {
            header,
            main,
            merged: Dataset::new(DatasetRole::Merged, merged),
            thresholds,
            sort,
        })
    }

    /// Build the source context; `data` becomes the `source` dataset
    pub fn source_context(&self) -> Result<SourceContext, RenderError> {
        let header = self.header()?;
        let source = Dataset::new(DatasetRole::Source, self.data()?);
        let thresholds = self.thresholds()?;
        Ok(SourceContext {
            header,
            source,
            thresholds,
        })
    }
}

fn number(name: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .with_context(|| format!("`{}` must be a number (got {})", name, value))
}

/// Read and parse a page data file in either encoding
pub fn load_page_file(path: &Path) -> Result<PageData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read page data: {}", path.display()))?;
    PageData::parse(&content)
        .with_context(|| format!("failed to parse page data: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_SCRIPT: &str = r#"var data = [
{"link":"a.c.1.html","title":"a.c","summary_name":"a.c","covered_class":"lineCov","covered":"80.0","covered_lines":"8","uncovered_lines":"2","total_lines" : "10"},
];
var percent_low = 25;var percent_high = 75;
var header = { "command" : "./a.out", "date" : "2024-01-01 12:00:00", "instrumented" : 10, "covered" : 8,};
var merged_data = [];
"#;

    #[test]
    fn test_index_context_from_script() {
        let page = PageData::from_script(INDEX_SCRIPT).unwrap();
        let ctx = page.index_context(SortIntent::default()).unwrap();
        assert_eq!(ctx.header.command, "./a.out");
        assert_eq!(ctx.header.covered, 8);
        assert_eq!(ctx.main.role, DatasetRole::Main);
        assert_eq!(ctx.main.len(), 1);
        assert!(ctx.merged.is_empty());
        assert_eq!(ctx.thresholds, Thresholds::default());
    }

    #[test]
    fn test_source_context_reuses_data() {
        let page = PageData::from_script(INDEX_SCRIPT).unwrap();
        let ctx = page.source_context().unwrap();
        assert_eq!(ctx.source.role, DatasetRole::Source);
        assert_eq!(ctx.source.len(), 1);
    }

    #[test]
    fn test_missing_items_are_reported_in_order() {
        let mut page = PageData::default();
        assert_eq!(
            page.source_context(),
            Err(RenderError::MissingGlobalData { name: "header" })
        );

        page.header = Some(Header {
            command: "x".to_string(),
            date: "d".to_string(),
            covered: 0,
            instrumented: 0,
        });
        assert_eq!(
            page.source_context(),
            Err(RenderError::MissingGlobalData { name: "data" })
        );

        page.data = Some(Vec::new());
        assert_eq!(
            page.index_context(SortIntent::default()),
            Err(RenderError::MissingGlobalData {
                name: "merged_data"
            })
        );
        assert_eq!(
            page.source_context(),
            Err(RenderError::MissingGlobalData {
                name: "percent_low"
            })
        );

        page.percent_low = Some(10.0);
        assert_eq!(
            page.source_context(),
            Err(RenderError::MissingGlobalData {
                name: "percent_high"
            })
        );

        page.percent_high = Some(90.0);
        assert!(page.source_context().is_ok());
    }

    #[test]
    fn test_override_thresholds() {
        let mut page = PageData::from_script(INDEX_SCRIPT).unwrap();
        page.override_thresholds(Thresholds {
            percent_low: 50.0,
            percent_high: 95.0,
        });
        let ctx = page.source_context().unwrap();
        assert_eq!(ctx.thresholds.percent_low, 50.0);
        assert_eq!(ctx.thresholds.percent_high, 95.0);
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "header": {"command": "t", "date": "now", "covered": 1, "instrumented": 2},
            "data": [{"lineNum": "    1", "line": "int x;"}],
            "percent_low": 30,
            "percent_high": 70
        }"#;
        let page = PageData::parse(json).unwrap();
        assert!(page.merged_data.is_none());
        let ctx = page.source_context().unwrap();
        assert_eq!(ctx.thresholds.percent_low, 30.0);
    }

    #[test]
    fn test_non_numeric_threshold_is_rejected() {
        assert!(PageData::from_script("var percent_low = \"25\";").is_err());
    }

    #[test]
    fn test_unknown_variables_are_ignored() {
        let page = PageData::from_script("var something_else = [1];").unwrap();
        assert_eq!(page, PageData::default());
    }

    #[test]
    fn test_load_page_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, INDEX_SCRIPT).unwrap();
        let page = load_page_file(&path).unwrap();
        assert!(page.header.is_some());

        assert!(load_page_file(&dir.path().join("missing.json")).is_err());
    }
}
