//! Errors raised while building page contexts and applying render plans

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A display target id is absent from the surface
    #[error("element not found: #{id}")]
    ElementNotFound { id: String },

    /// A template slot is absent from the surface
    #[error("template slot not found: {slot}")]
    TemplateSlotNotFound { slot: String },

    /// A required page data item was never supplied
    #[error("missing page data: {name}")]
    MissingGlobalData { name: &'static str },
}

impl RenderError {
    pub fn element(id: impl Into<String>) -> Self {
        RenderError::ElementNotFound { id: id.into() }
    }

    pub fn slot(slot: impl Into<String>) -> Self {
        RenderError::TemplateSlotNotFound { slot: slot.into() }
    }
}
