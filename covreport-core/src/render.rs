//! Index and source renderers
//!
//! Global invariants enforced:
//! - Plan building is pure: identical context yields an identical plan
//! - Applying a plan never rolls back a write that succeeded
//! - A failed step stops only itself and the steps that depend on it

use crate::error::RenderError;
use crate::header::HeaderView;
use crate::page::{IndexContext, SourceContext};
use crate::plan::{
    targets, PageKind, RenderPlan, RenderStep, SortActivation, TemplateBinding, WriteKind,
};
use crate::record::Dataset;
use crate::surface::DisplaySurface;
use serde::Serialize;
use std::collections::BTreeSet;

fn bind(dataset: &Dataset) -> RenderStep {
    RenderStep::Bind(TemplateBinding {
        slot: dataset.role.slot().to_string(),
        records: dataset.records.clone(),
    })
}

fn header_step(view: &HeaderView) -> RenderStep {
    RenderStep::Header {
        writes: view.writes(),
    }
}

/// Plan for the index page: main rows, merged rows, header, table sort
pub fn render_index(ctx: &IndexContext) -> RenderPlan {
    let view = HeaderView::new(&ctx.header, &ctx.thresholds);
    let main = bind(&ctx.main);
    let requires = ctx.main.role.slot().to_string();

    RenderPlan {
        page: PageKind::Index,
        steps: vec![
            main,
            bind(&ctx.merged),
            header_step(&view),
            RenderStep::ActivateSort(SortActivation {
                table: targets::INDEX_TABLE.to_string(),
                intent: ctx.sort.clone(),
                requires,
            }),
        ],
    }
}

/// Plan for a source page: annotated lines, then header
pub fn render_source(ctx: &SourceContext) -> RenderPlan {
    let view = HeaderView::new(&ctx.header, &ctx.thresholds);
    RenderPlan {
        page: PageKind::Source,
        steps: vec![bind(&ctx.source), header_step(&view)],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    /// Rows rendered, for bind steps that succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub cause: Option<RenderError>,
}

/// What happened when a plan was applied
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<StepOutcome>,
}

impl ApplyReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == StepStatus::Applied)
    }

    pub fn errors(&self) -> impl Iterator<Item = &RenderError> {
        self.outcomes.iter().filter_map(|o| o.cause.as_ref())
    }

    pub fn rows(&self, slot: &str) -> Option<usize> {
        let label = format!("bind {}", slot);
        self.outcomes
            .iter()
            .find(|o| o.step == label)
            .and_then(|o| o.rows)
    }

    fn push(&mut self, step: String, result: Result<Option<usize>, RenderError>) {
        let outcome = match result {
            Ok(rows) => {
                tracing::debug!("applied {}", step);
                StepOutcome {
                    step,
                    status: StepStatus::Applied,
                    rows,
                    error: None,
                    cause: None,
                }
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", step, e);
                StepOutcome {
                    step,
                    status: StepStatus::Failed,
                    rows: None,
                    error: Some(e.to_string()),
                    cause: Some(e),
                }
            }
        };
        self.outcomes.push(outcome);
    }

    fn skip(&mut self, step: String, reason: String) {
        tracing::warn!("{} skipped: {}", step, reason);
        self.outcomes.push(StepOutcome {
            step,
            status: StepStatus::Skipped,
            rows: None,
            error: Some(reason),
            cause: None,
        });
    }
}

/// Apply a plan to a surface, step by step.
///
/// Within the header step the first failed write stops the remaining
/// writes. Sort activation is skipped when the slot it requires failed to
/// bind.
pub fn apply<S: DisplaySurface + ?Sized>(plan: &RenderPlan, surface: &mut S) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut failed_slots = BTreeSet::new();

    for step in &plan.steps {
        let label = step.label();
        match step {
            RenderStep::Bind(binding) => {
                let result = surface.bind_template(&binding.slot, &binding.records);
                if result.is_err() {
                    failed_slots.insert(binding.slot.clone());
                }
                report.push(label, result.map(Some));
            }
            RenderStep::Header { writes } => {
                let result = writes.iter().try_for_each(|w| match w.kind {
                    WriteKind::Text => surface.set_text(&w.target, &w.value),
                    WriteKind::Class => surface.set_class(&w.target, &w.value),
                });
                report.push(label, result.map(|_| None));
            }
            RenderStep::ActivateSort(sort) => {
                if failed_slots.contains(&sort.requires) {
                    report.skip(label, format!("{} was not rendered", sort.requires));
                    continue;
                }
                let result = surface.activate_sort(&sort.table, &sort.intent);
                report.push(label, result.map(|_| None));
            }
        }
    }

    report
}
