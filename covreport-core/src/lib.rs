//! covreport core library - render plans for kcov-style coverage report pages

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Renderers read only their explicit context, never ambient state
// - Plan building is pure; surfaces are touched only by `render::apply`
// - The header classifier and the producer row classifier stay separate
// - Coverage records pass through to templates untouched

pub mod classify;
pub mod config;
pub mod error;
pub mod header;
pub mod html;
pub mod page;
pub mod plan;
pub mod record;
pub mod render;
pub mod script;
pub mod sort;
pub mod surface;
pub mod template;

pub use classify::{classify, classify_ratio, CoverageClass, Thresholds};
pub use config::ResolvedConfig;
pub use error::RenderError;
pub use page::{load_page_file, IndexContext, PageData, SourceContext};
pub use plan::RenderPlan;
pub use render::{apply, render_index, render_source, ApplyReport};
pub use surface::DisplaySurface;

use anyhow::Result;
use std::path::Path;

/// Load page data and apply configured limit overrides
pub fn load_page(path: &Path, config: &ResolvedConfig) -> Result<PageData> {
    let mut page = load_page_file(path)?;
    if let Some(limits) = config.limits {
        page.override_thresholds(limits);
    }
    Ok(page)
}

/// Load the context of an index page
pub fn load_index_context(path: &Path, config: &ResolvedConfig) -> Result<IndexContext> {
    let page = load_page(path, config)?;
    Ok(page.index_context(config.sort_intent())?)
}

/// Load the context of a source page
pub fn load_source_context(path: &Path, config: &ResolvedConfig) -> Result<SourceContext> {
    let page = load_page(path, config)?;
    Ok(page.source_context()?)
}
