//! Static HTML display surface
//!
//! Renders report pages as self-contained HTML documents. Rows are expanded
//! here from row templates; only the interactive table sorter is left to the
//! browser, loaded from the producer's `data/js/` assets.

use crate::error::RenderError;
use crate::page::{IndexContext, SourceContext};
use crate::plan::{targets, PageKind};
use crate::record::CoverageRecord;
use crate::render::{self, ApplyReport};
use crate::sort::SortIntent;
use crate::surface::DisplaySurface;
use crate::template::{self, RowTemplate};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Script assets the sort widget needs, relative to the page
const SORT_SCRIPTS: &[&str] = &[
    "data/js/jquery.min.js",
    "data/js/tablesorter.min.js",
    "data/js/jquery.tablesorter.widgets.min.js",
];

const SORT_THEME_CSS: &str = "data/tablesorter-theme.css";

#[derive(Debug, Clone, Default)]
struct Element {
    text: Option<String>,
    class: Option<String>,
}

#[derive(Debug, Clone)]
struct Slot {
    template: RowTemplate,
    rows: Option<String>,
}

/// In-memory page shell that a render plan is applied to
#[derive(Debug, Clone)]
pub struct HtmlSurface {
    kind: PageKind,
    elements: BTreeMap<String, Element>,
    slots: BTreeMap<String, Slot>,
    sort: Option<(String, SortIntent)>,
}

impl HtmlSurface {
    fn with_layout(kind: PageKind, ids: &[&str], slots: &[&str]) -> Result<Self> {
        let mut surface = HtmlSurface {
            kind,
            elements: ids
                .iter()
                .map(|id| (id.to_string(), Element::default()))
                .collect(),
            slots: BTreeMap::new(),
            sort: None,
        };
        for slot in slots {
            let src = template::builtin(slot)
                .with_context(|| format!("no built-in template for slot {}", slot))?;
            surface = surface.with_template(slot, src)?;
        }
        Ok(surface)
    }

    /// Shell of the index page: header, index table, merged block
    pub fn index_page() -> Result<Self> {
        let mut ids = targets::HEADER.to_vec();
        ids.push(targets::INDEX_TABLE);
        HtmlSurface::with_layout(PageKind::Index, &ids, &["main-data", "merged-data"])
    }

    /// Shell of a source page: header and the annotated listing
    pub fn source_page() -> Result<Self> {
        HtmlSurface::with_layout(PageKind::Source, &targets::HEADER, &["source-code"])
    }

    /// Replace (or declare) a slot's row template
    pub fn with_template(mut self, slot: &str, src: &str) -> Result<Self> {
        let template = RowTemplate::parse(src)
            .with_context(|| format!("invalid row template for slot {}", slot))?;
        self.slots.insert(
            slot.to_string(),
            Slot {
                template,
                rows: None,
            },
        );
        Ok(self)
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut Element, RenderError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| RenderError::element(id))
    }

    fn text(&self, id: &str) -> String {
        self.elements
            .get(id)
            .and_then(|e| e.text.as_deref())
            .map(html_escape)
            .unwrap_or_default()
    }

    fn class_attr(&self, id: &str, base: &str) -> String {
        let extra = self.elements.get(id).and_then(|e| e.class.as_deref());
        match (base.is_empty(), extra) {
            (true, None) => String::new(),
            (true, Some(c)) => format!(r#" class="{}""#, html_escape(c)),
            (false, None) => format!(r#" class="{}""#, base),
            (false, Some(c)) => format!(r#" class="{} {}""#, base, html_escape(c)),
        }
    }

    fn rows(&self, slot: &str) -> &str {
        self.slots
            .get(slot)
            .and_then(|s| s.rows.as_deref())
            .unwrap_or("")
    }

    /// Produce the finished document
    pub fn finish(&self) -> Result<String> {
        let body = match self.kind {
            PageKind::Index => self.render_index_body(),
            PageKind::Source => self.render_source_body(),
        };
        let (sort_head, sort_script) = self.render_sort()?;

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title id="window-title">{title}</title>
    <style>{css}</style>{sort_head}
</head>
<body>
    <div class="container">
        {header}
        {body}
        {footer}
    </div>{sort_script}
</body>
</html>"#,
            title = self.text(targets::WINDOW_TITLE),
            css = inline_css(),
            sort_head = sort_head,
            header = self.render_header(),
            body = body,
            footer = render_footer(),
            sort_script = sort_script,
        ))
    }

    fn render_header(&self) -> String {
        format!(
            r#"<header>
    <h1>Coverage report</h1>
    <table class="header-table">
        <tr><td class="headerItem">Command:</td><td class="headerValue" id="header-command"{command_class}>{command}</td></tr>
        <tr><td class="headerItem">Date:</td><td class="headerValue" id="header-date"{date_class}>{date}</td></tr>
        <tr><td class="headerItem">Instrumented lines:</td><td class="headerValue" id="header-instrumented"{instr_class}>{instrumented}</td></tr>
        <tr><td class="headerItem">Executed lines:</td><td class="headerValue" id="header-covered"{covered_class}>{covered}</td></tr>
        <tr><td class="headerItem">Code covered:</td><td id="header-percent-covered"{percent_class}>{percent}</td></tr>
    </table>
</header>"#,
            command = self.text(targets::COMMAND),
            command_class = self.class_attr(targets::COMMAND, ""),
            date = self.text(targets::DATE),
            date_class = self.class_attr(targets::DATE, ""),
            instrumented = self.text(targets::INSTRUMENTED),
            instr_class = self.class_attr(targets::INSTRUMENTED, ""),
            covered = self.text(targets::COVERED),
            covered_class = self.class_attr(targets::COVERED, ""),
            percent = self.text(targets::PERCENT_COVERED),
            percent_class = self.class_attr(targets::PERCENT_COVERED, ""),
        )
    }

    fn render_index_body(&self) -> String {
        format!(
            r#"<section class="section">
    <table id="index-table"{table_class}>
        <thead>
            <tr>
                <th>Filename</th>
                <th>Coverage percent</th>
                <th>Covered lines</th>
                <th>Uncovered lines</th>
                <th>Executable lines</th>
            </tr>
        </thead>
        <tbody class="tablesorter-no-sort" id="merged-data">
{merged}
        </tbody>
        <tbody id="main-data">
{main}
        </tbody>
    </table>
</section>"#,
            table_class = self.class_attr(targets::INDEX_TABLE, "tablesorter"),
            merged = self.rows("merged-data"),
            main = self.rows("main-data"),
        )
    }

    fn render_source_body(&self) -> String {
        format!(
            r#"<section class="section">
    <table class="source-table">
        <tbody id="source-code">
{rows}
        </tbody>
    </table>
</section>"#,
            rows = self.rows("source-code"),
        )
    }

    /// Head links and init script for the sort widget, empty when sorting
    /// was never activated
    fn render_sort(&self) -> Result<(String, String)> {
        let Some((table, intent)) = &self.sort else {
            return Ok((String::new(), String::new()));
        };
        let options = intent
            .to_options_json()
            .context("failed to serialize sort options")?
            .replace("</", "<\\/");
        let head = format!(
            "\n    <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">",
            SORT_THEME_CSS
        );
        let scripts: String = SORT_SCRIPTS
            .iter()
            .map(|src| format!("\n    <script type=\"text/javascript\" src=\"{}\"></script>", src))
            .collect();
        let script = format!(
            "{scripts}\n    <script type=\"text/javascript\">\n    $(function() {{ $(\"#{table}\").tablesorter({options}); }});\n    </script>",
            scripts = scripts,
            table = html_escape(table),
            options = options,
        );
        Ok((head, script))
    }
}

impl DisplaySurface for HtmlSurface {
    fn set_text(&mut self, target: &str, text: &str) -> Result<(), RenderError> {
        self.element_mut(target)?.text = Some(text.to_string());
        Ok(())
    }

    fn set_class(&mut self, target: &str, class: &str) -> Result<(), RenderError> {
        self.element_mut(target)?.class = Some(class.to_string());
        Ok(())
    }

    fn bind_template(
        &mut self,
        slot: &str,
        records: &[CoverageRecord],
    ) -> Result<usize, RenderError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| RenderError::slot(slot))?;
        entry.rows = Some(entry.template.render_all(records));
        Ok(records.len())
    }

    fn activate_sort(&mut self, table: &str, intent: &SortIntent) -> Result<(), RenderError> {
        self.element_mut(table)?;
        self.sort = Some((table.to_string(), intent.clone()));
        Ok(())
    }
}

/// Render an index page to HTML
pub fn render_index_html(ctx: &IndexContext) -> Result<(String, ApplyReport)> {
    let plan = render::render_index(ctx);
    let mut surface = HtmlSurface::index_page()?;
    let report = render::apply(&plan, &mut surface);
    Ok((surface.finish()?, report))
}

/// Render a source page to HTML
pub fn render_source_html(ctx: &SourceContext) -> Result<(String, ApplyReport)> {
    let plan = render::render_source(ctx);
    let mut surface = HtmlSurface::source_page()?;
    let report = render::apply(&plan, &mut surface);
    Ok((surface.finish()?, report))
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
* {
    box-sizing: border-box;
    margin: 0;
    padding: 0;
}

body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    line-height: 1.6;
    color: #111827;
    background: #ffffff;
}

.container {
    max-width: 1400px;
    margin: 0 auto;
    padding: 2rem;
}

header {
    margin-bottom: 2rem;
    padding-bottom: 1rem;
    border-bottom: 2px solid #e5e7eb;
}

header h1 {
    font-size: 2rem;
    font-weight: 700;
    margin-bottom: 0.5rem;
}

.headerItem {
    color: #6b7280;
    padding-right: 1rem;
    font-size: 0.875rem;
}

.headerValue {
    font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace;
    font-size: 0.875rem;
}

table {
    width: 100%;
    border-collapse: collapse;
}

th, td {
    padding: 0.25rem 0.75rem;
    text-align: left;
}

#index-table th {
    background: #f3f4f6;
    border-bottom: 2px solid #e5e7eb;
    font-weight: 600;
}

#index-table td {
    border-bottom: 1px solid #f3f4f6;
}

.coverNum, .coverPer {
    text-align: right;
    font-variant-numeric: tabular-nums;
}

.coverPerLeftLo { background: #fee2e2; color: #991b1b; font-weight: 700; }
.coverPerLeftMed { background: #fef3c7; color: #92400e; font-weight: 700; }
.coverPerLeftHi { background: #dcfce7; color: #166534; font-weight: 700; }

.lineNoCov { background: #fee2e2; }
.linePartCov { background: #fef3c7; }
.lineCov { background: #dcfce7; }

.tablesorter-no-sort td {
    font-style: italic;
    background: #f9fafb;
}

.source-table {
    font-family: 'SF Mono', Monaco, 'Cascadia Code', monospace;
    font-size: 0.8125rem;
}

.source-table pre {
    white-space: pre;
    font: inherit;
}

.lineNum, .hits {
    color: #6b7280;
    text-align: right;
    width: 1%;
    white-space: pre;
}

footer {
    margin-top: 3rem;
    padding-top: 1rem;
    border-top: 1px solid #e5e7eb;
    text-align: center;
    color: #6b7280;
    font-size: 0.875rem;
}
"#
}

/// Render footer
fn render_footer() -> String {
    r#"<footer>
    <p>Generated by covreport</p>
</footer>"#
        .to_string()
}

/// Escape HTML special characters
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
