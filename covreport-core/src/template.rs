//! Row templates
//!
//! A template is markup with `{{ field }}` placeholders. Rendering a
//! record substitutes each placeholder with the record's field, HTML-escaped.

use crate::html::html_escape;
use crate::record::CoverageRecord;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowTemplate {
    pieces: Vec<Piece>,
}

impl RowTemplate {
    pub fn parse(src: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut rest = src;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                pieces.push(Piece::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = match after.find("}}") {
                Some(close) => close,
                None => anyhow::bail!(
                    "unterminated placeholder at offset {}",
                    src.len() - rest.len() + open
                ),
            };
            let name = after[..close].trim();
            if name.is_empty() {
                anyhow::bail!(
                    "empty placeholder at offset {}",
                    src.len() - rest.len() + open
                );
            }
            pieces.push(Piece::Field(name.to_string()));
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Literal(rest.to_string()));
        }

        Ok(RowTemplate { pieces })
    }

    /// Field names in placeholder order
    pub fn fields(&self) -> Vec<&str> {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Field(name) => Some(name.as_str()),
                Piece::Literal(_) => None,
            })
            .collect()
    }

    pub fn render(&self, record: &CoverageRecord) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Field(name) => out.push_str(&html_escape(&record.field_text(name))),
            }
        }
        out
    }

    pub fn render_all(&self, records: &[CoverageRecord]) -> String {
        records
            .iter()
            .map(|r| self.render(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Row of the index tables (`main-data` and `merged-data`)
pub const INDEX_ROW: &str = r#"<tr>
    <td class="coverFile"><a href="{{link}}" title="{{title}}">{{summary_name}}</a></td>
    <td class="coverPer"><span class="{{covered_class}}">{{covered}}%</span></td>
    <td class="coverNum">{{covered_lines}}</td>
    <td class="coverNum">{{uncovered_lines}}</td>
    <td class="coverNum">{{total_lines}}</td>
</tr>"#;

/// Row of an annotated source listing (`source-code`)
pub const SOURCE_ROW: &str = r#"<tr class="{{class}}">
    <td class="lineNum">{{lineNum}}</td>
    <td class="hits">{{hits}}</td>
    <td class="lineSrc"><pre>{{line}}</pre></td>
</tr>"#;

/// Built-in template for a slot, if the slot is known
pub fn builtin(slot: &str) -> Option<&'static str> {
    match slot {
        "main-data" | "merged-data" => Some(INDEX_ROW),
        "source-code" => Some(SOURCE_ROW),
        _ => None,
    }
}
