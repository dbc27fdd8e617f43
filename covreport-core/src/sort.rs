//! Declarative sort-widget configuration
//!
//! The interactive table sorter is external; the renderer only describes
//! how it should be initialized. The serialized form uses the widget's own
//! option names.

use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "blue";
pub const DEFAULT_SORT_COLUMN: usize = 1;
pub const NO_SORT_CLASS: &str = "tablesorter-no-sort";
pub const SAVE_SORT_WIDGET: &str = "saveSort";

/// Sort direction, encoded as the widget's integer flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Encoded as `0`
    Descending,
    /// Encoded as `1`
    Ascending,
}

impl SortDirection {
    pub fn code(&self) -> u8 {
        match self {
            SortDirection::Descending => 0,
            SortDirection::Ascending => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SortDirection::Descending),
            1 => Some(SortDirection::Ascending),
            _ => None,
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for SortDirection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        SortDirection::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid sort direction {}", code)))
    }
}

/// One `[column, direction]` pair of the initial sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey(pub usize, pub SortDirection);

/// Initialization options for the table sorter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortIntent {
    pub theme: String,
    pub sort_list: Vec<SortKey>,
    /// Class marking the non-sortable info block
    pub css_info_block: String,
    pub widgets: Vec<String>,
}

impl Default for SortIntent {
    fn default() -> Self {
        SortIntent {
            theme: DEFAULT_THEME.to_string(),
            sort_list: vec![SortKey(DEFAULT_SORT_COLUMN, SortDirection::Descending)],
            css_info_block: NO_SORT_CLASS.to_string(),
            widgets: vec![SAVE_SORT_WIDGET.to_string()],
        }
    }
}

impl SortIntent {
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_initial_column(mut self, column: usize) -> Self {
        self.sort_list = vec![SortKey(column, SortDirection::Descending)];
        self
    }

    /// Whether the sort order survives page reloads
    pub fn persists_sort(&self) -> bool {
        self.widgets.iter().any(|w| w == SAVE_SORT_WIDGET)
    }

    /// Options object as JSON, ready to hand to the widget
    pub fn to_options_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
