//! Render instruction sets
//!
//! A `RenderPlan` says exactly what text and class goes where, which
//! dataset fills which template slot, and how the sort widget starts. It
//! carries no reference to a display surface; `render::apply` executes it.

use crate::record::CoverageRecord;
use crate::sort::SortIntent;
use serde::Serialize;

/// Stable display target ids of the page shell
pub mod targets {
    pub const PERCENT_COVERED: &str = "header-percent-covered";
    pub const COMMAND: &str = "header-command";
    pub const WINDOW_TITLE: &str = "window-title";
    pub const DATE: &str = "header-date";
    pub const COVERED: &str = "header-covered";
    pub const INSTRUMENTED: &str = "header-instrumented";
    pub const INDEX_TABLE: &str = "index-table";

    /// Targets written by the header step, in write order (deduplicated)
    pub const HEADER: [&str; 6] = [
        PERCENT_COVERED,
        COMMAND,
        WINDOW_TITLE,
        DATE,
        COVERED,
        INSTRUMENTED,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Index,
    Source,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Index => "index",
            PageKind::Source => "source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    /// Element content
    Text,
    /// Element class attribute
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayWrite {
    pub target: String,
    pub kind: WriteKind,
    pub value: String,
}

impl DisplayWrite {
    pub fn text(target: &str, value: &str) -> Self {
        DisplayWrite {
            target: target.to_string(),
            kind: WriteKind::Text,
            value: value.to_string(),
        }
    }

    pub fn class(target: &str, value: &str) -> Self {
        DisplayWrite {
            target: target.to_string(),
            kind: WriteKind::Class,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateBinding {
    pub slot: String,
    pub records: Vec<CoverageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortActivation {
    pub table: String,
    pub intent: SortIntent,
    /// Slot whose rows the table must hold before it can be sorted
    pub requires: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RenderStep {
    Bind(TemplateBinding),
    Header { writes: Vec<DisplayWrite> },
    ActivateSort(SortActivation),
}

impl RenderStep {
    /// Short label used in apply reports and logs
    pub fn label(&self) -> String {
        match self {
            RenderStep::Bind(binding) => format!("bind {}", binding.slot),
            RenderStep::Header { .. } => "header".to_string(),
            RenderStep::ActivateSort(sort) => format!("sort #{}", sort.table),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub page: PageKind,
    pub steps: Vec<RenderStep>,
}

impl RenderPlan {
    pub fn bindings(&self) -> impl Iterator<Item = &TemplateBinding> {
        self.steps.iter().filter_map(|s| match s {
            RenderStep::Bind(b) => Some(b),
            _ => None,
        })
    }

    pub fn binding(&self, slot: &str) -> Option<&TemplateBinding> {
        self.bindings().find(|b| b.slot == slot)
    }

    pub fn sort(&self) -> Option<&SortActivation> {
        self.steps.iter().find_map(|s| match s {
            RenderStep::ActivateSort(a) => Some(a),
            _ => None,
        })
    }

    pub fn header_writes(&self) -> &[DisplayWrite] {
        self.steps
            .iter()
            .find_map(|s| match s {
                RenderStep::Header { writes } => Some(writes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
