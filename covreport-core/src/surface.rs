//! Display surfaces
//!
//! A surface is whatever a render plan is applied to: a static HTML page,
//! a live document, or the in-memory recorder used by tests and dry runs.

use crate::error::RenderError;
use crate::record::CoverageRecord;
use crate::sort::SortIntent;
use std::collections::{BTreeMap, BTreeSet};

/// Operations a render plan needs from a display surface.
///
/// Each call fails on its own; a failed call leaves earlier writes in place.
pub trait DisplaySurface {
    fn set_text(&mut self, target: &str, text: &str) -> Result<(), RenderError>;

    fn set_class(&mut self, target: &str, class: &str) -> Result<(), RenderError>;

    /// Expand `records` into the slot; returns the number of rows rendered
    fn bind_template(
        &mut self,
        slot: &str,
        records: &[CoverageRecord],
    ) -> Result<usize, RenderError>;

    fn activate_sort(&mut self, table: &str, intent: &SortIntent) -> Result<(), RenderError>;
}

/// Surface operation as observed by `RecordingSurface`
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Text { target: String, text: String },
    Class { target: String, class: String },
    Bind { slot: String, rows: usize },
    Sort { table: String, intent: SortIntent },
}

/// In-memory surface with a declared set of ids and slots.
///
/// Writing to an undeclared id fails the way a real document lookup would.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ids: BTreeSet<String>,
    slots: BTreeSet<String>,
    texts: BTreeMap<String, String>,
    classes: BTreeMap<String, String>,
    rows: BTreeMap<String, usize>,
    sort: Option<(String, SortIntent)>,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new<I, S, J, T>(ids: I, slots: J) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        RecordingSurface {
            ids: ids.into_iter().map(Into::into).collect(),
            slots: slots.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Surface with every id and slot an index page uses
    pub fn index_page() -> Self {
        let mut ids: Vec<&str> = crate::plan::targets::HEADER.to_vec();
        ids.push(crate::plan::targets::INDEX_TABLE);
        RecordingSurface::new(ids, ["main-data", "merged-data"])
    }

    /// Surface with every id and slot a source page uses
    pub fn source_page() -> Self {
        RecordingSurface::new(crate::plan::targets::HEADER, ["source-code"])
    }

    pub fn text(&self, target: &str) -> Option<&str> {
        self.texts.get(target).map(String::as_str)
    }

    pub fn class(&self, target: &str) -> Option<&str> {
        self.classes.get(target).map(String::as_str)
    }

    pub fn rows(&self, slot: &str) -> Option<usize> {
        self.rows.get(slot).copied()
    }

    pub fn sort(&self) -> Option<&(String, SortIntent)> {
        self.sort.as_ref()
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    fn check_id(&self, id: &str) -> Result<(), RenderError> {
        if self.ids.contains(id) {
            Ok(())
        } else {
            Err(RenderError::element(id))
        }
    }
}

impl DisplaySurface for RecordingSurface {
    fn set_text(&mut self, target: &str, text: &str) -> Result<(), RenderError> {
        self.check_id(target)?;
        self.texts.insert(target.to_string(), text.to_string());
        self.ops.push(SurfaceOp::Text {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn set_class(&mut self, target: &str, class: &str) -> Result<(), RenderError> {
        self.check_id(target)?;
        self.classes.insert(target.to_string(), class.to_string());
        self.ops.push(SurfaceOp::Class {
            target: target.to_string(),
            class: class.to_string(),
        });
        Ok(())
    }

    fn bind_template(
        &mut self,
        slot: &str,
        records: &[CoverageRecord],
    ) -> Result<usize, RenderError> {
        if !self.slots.contains(slot) {
            return Err(RenderError::slot(slot));
        }
        self.rows.insert(slot.to_string(), records.len());
        self.ops.push(SurfaceOp::Bind {
            slot: slot.to_string(),
            rows: records.len(),
        });
        Ok(records.len())
    }

    fn activate_sort(&mut self, table: &str, intent: &SortIntent) -> Result<(), RenderError> {
        self.check_id(table)?;
        self.sort = Some((table.to_string(), intent.clone()));
        self.ops.push(SurfaceOp::Sort {
            table: table.to_string(),
            intent: intent.clone(),
        });
        Ok(())
    }
}
