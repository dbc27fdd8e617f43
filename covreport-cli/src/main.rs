//! covreport CLI - render kcov-style coverage data into HTML report pages

#![deny(warnings)]

// Global invariants enforced:
// - Pages are written atomically; a failed render never leaves a half file
// - Identical data and config yield byte-for-byte identical pages

use anyhow::Context;
use clap::{Parser, Subcommand};
use covreport_core::html::{render_index_html, render_source_html};
use covreport_core::plan::PageKind;
use covreport_core::surface::RecordingSurface;
use covreport_core::{
    apply, config, load_index_context, load_source_context, render_index, render_source,
    ApplyReport, ResolvedConfig, Thresholds,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "covreport")]
#[command(about = "Render kcov-style coverage data into static HTML report pages")]
#[command(version = env!("COVREPORT_VERSION"))]
struct Cli {
    /// Path to config file (default: auto-discover)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Coverage limits as LOW,HIGH (overrides config file and page data)
    #[arg(long, global = true, value_parser = parse_limits_arg)]
    limits: Option<Thresholds>,

    /// Log render steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an index page
    Index {
        /// Page data file (kcov `index.json` script or JSON document)
        data: PathBuf,

        /// Output file path (default: data file with .html extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a source page
    Source {
        /// Page data file (kcov per-file script or JSON document)
        data: PathBuf,

        /// Output file path (default: data file with .html extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the render plan of a page, with a dry-run apply report
    Plan {
        /// Page data file
        data: PathBuf,

        /// Page kind to plan
        #[arg(long, default_value = "index")]
        page: PageArg,
    },
    /// Render every data file under a kcov output directory
    Build {
        /// kcov output directory
        dir: PathBuf,

        /// Output directory (default: alongside the data files)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without rendering
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum PageArg {
    Index,
    Source,
}

impl From<PageArg> for PageKind {
    fn from(page: PageArg) -> Self {
        match page {
            PageArg::Index => PageKind::Index,
            PageArg::Source => PageKind::Source,
        }
    }
}

fn parse_limits_arg(s: &str) -> Result<Thresholds, String> {
    config::parse_limits(s).map_err(|e| format!("{:#}", e))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Index { data, output } => {
            let resolved = load_config(cli.config.as_deref(), cli.limits)?;
            let out = output.unwrap_or_else(|| default_output(&data));
            let report = render_page(&data, PageKind::Index, &out, &resolved)?;
            warn_incomplete(&out, &report);
            eprintln!("HTML report written to: {}", out.display());
        }
        Commands::Source { data, output } => {
            let resolved = load_config(cli.config.as_deref(), cli.limits)?;
            let out = output.unwrap_or_else(|| default_output(&data));
            let report = render_page(&data, PageKind::Source, &out, &resolved)?;
            warn_incomplete(&out, &report);
            eprintln!("HTML report written to: {}", out.display());
        }
        Commands::Plan { data, page } => {
            let resolved = load_config(cli.config.as_deref(), cli.limits)?;
            let (plan, report) = match PageKind::from(page) {
                PageKind::Index => {
                    let plan = render_index(&load_index_context(&data, &resolved)?);
                    let report = apply(&plan, &mut RecordingSurface::index_page());
                    (plan, report)
                }
                PageKind::Source => {
                    let plan = render_source(&load_source_context(&data, &resolved)?);
                    let report = apply(&plan, &mut RecordingSurface::source_page());
                    (plan, report)
                }
            };
            let out = serde_json::json!({ "plan": plan, "report": report });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Build { dir, output, quiet } => {
            if !dir.is_dir() {
                anyhow::bail!("Not a directory: {}", dir.display());
            }
            let resolved = load_config(cli.config.as_deref(), cli.limits)?;
            let out_dir = output.unwrap_or_else(|| dir.clone());
            let summary = build_reports(&dir, &out_dir, &resolved, quiet)?;
            eprintln!(
                "Rendered {} page(s) into {}",
                summary.written,
                out_dir.display()
            );
            if !summary.failed.is_empty() {
                for (path, err) in &summary.failed {
                    eprintln!("  {}: {:#}", path.display(), err);
                }
                anyhow::bail!("{} page(s) failed to render", summary.failed.len());
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let root = std::env::current_dir()?;
                match config::load_and_resolve(&root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&root, path.as_deref())
                    .context("failed to load configuration")?
                    .with_limits(cli.limits);
                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>, limits: Option<Thresholds>) -> anyhow::Result<ResolvedConfig> {
    let root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&root, path)
        .context("failed to load configuration")?
        .with_limits(limits);
    if let Some(ref p) = resolved.config_path {
        eprintln!("Using config: {}", p.display());
    }
    Ok(resolved)
}

fn default_output(data: &Path) -> PathBuf {
    data.with_extension("html")
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::from("Configuration:\n");
    match resolved.config_path {
        Some(ref p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults (no config file found)\n"),
    }
    out.push_str("\nLimits:\n");
    match resolved.limits {
        Some(t) => out.push_str(&format!(
            "  low: {}\n  high: {}\n",
            t.percent_low, t.percent_high
        )),
        None => out.push_str("  from page data\n"),
    }
    let intent = resolved.sort_intent();
    out.push_str("\nSorting:\n");
    out.push_str(&format!("  theme: {}\n", intent.theme));
    if let Some(key) = intent.sort_list.first() {
        out.push_str(&format!("  initial column: {}\n", key.0));
    }
    out.push_str("\nExclude:\n");
    if resolved.exclude_patterns.is_empty() {
        out.push_str("  (none)\n");
    }
    for pattern in &resolved.exclude_patterns {
        out.push_str(&format!("  {}\n", pattern));
    }
    out
}

/// Render one page and write it to `out`
fn render_page(
    data: &Path,
    kind: PageKind,
    out: &Path,
    resolved: &ResolvedConfig,
) -> anyhow::Result<ApplyReport> {
    let (html, report) = match kind {
        PageKind::Index => render_index_html(&load_index_context(data, resolved)?)?,
        PageKind::Source => render_source_html(&load_source_context(data, resolved)?)?,
    };
    write_html_report(out, &html)?;
    tracing::debug!("wrote {} page {}", kind.as_str(), out.display());
    Ok(report)
}

fn warn_incomplete(out: &Path, report: &ApplyReport) {
    let problems: Vec<String> = report.errors().map(|e| e.to_string()).collect();
    if !report.is_complete() {
        eprintln!(
            "warning: {} rendered partially ({})",
            out.display(),
            if problems.is_empty() {
                "steps skipped".to_string()
            } else {
                problems.join("; ")
            }
        );
    }
}

struct BuildSummary {
    written: usize,
    failed: Vec<(PathBuf, anyhow::Error)>,
}

/// Page kind of a data file in kcov output
fn page_kind(path: &Path) -> PageKind {
    if path.file_name().and_then(|n| n.to_str()) == Some("index.json") {
        PageKind::Index
    } else {
        PageKind::Source
    }
}

/// Data files under `dir`, relative to it, in file name order
/// kcov names page data `index.json` or `<file>.<hex crc>.json`
fn is_page_data_name(name: &str) -> bool {
    if name == "index.json" {
        return true;
    }
    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    match stem.rsplit_once('.') {
        Some((file, crc)) => {
            !file.is_empty() && !crc.is_empty() && crc.bytes().all(|b| b.is_ascii_hexdigit())
        }
        None => false,
    }
}

fn find_data_files(dir: &Path, resolved: &ResolvedConfig) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().is_some_and(is_page_data_name))
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .filter(|rel| !resolved.should_exclude(rel))
        .collect()
}

fn build_reports(
    dir: &Path,
    out_dir: &Path,
    resolved: &ResolvedConfig,
    quiet: bool,
) -> anyhow::Result<BuildSummary> {
    let files = find_data_files(dir, resolved);
    tracing::debug!("found {} data file(s) under {}", files.len(), dir.display());

    let pb = if !quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results: Vec<(PathBuf, anyhow::Result<ApplyReport>)> = files
        .par_iter()
        .map(|rel| {
            let out = default_output(&out_dir.join(rel));
            let result = render_page(&dir.join(rel), page_kind(rel), &out, resolved);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(rel.display().to_string());
            }
            (out, result)
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut summary = BuildSummary {
        written: 0,
        failed: Vec::new(),
    };
    for (out, result) in results {
        match result {
            Ok(report) => {
                warn_incomplete(&out, &report);
                summary.written += 1;
            }
            Err(e) => summary.failed.push((out, e)),
        }
    }
    Ok(summary)
}

/// Write HTML report to file with atomic write pattern
fn write_html_report(path: &Path, html: &str) -> anyhow::Result<()> {
    use std::fs;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("html.tmp");
    fs::write(&temp_path, html)
        .with_context(|| format!("Failed to write temporary file: {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INDEX: &str = r#"var data = [
{"link":"a.c.1.html","title":"a.c","summary_name":"a.c","covered_class":"lineCov","covered":"100.0","covered_lines":"2","uncovered_lines":"0","total_lines" : "2"},
];
var percent_low = 25;var percent_high = 75;
var header = { "command" : "t", "date" : "2024-01-01 00:00:00", "instrumented" : 2, "covered" : 2,};
var merged_data = [];
"#;

    const SOURCE: &str = r#"var data = [
{"lineNum":"    1","line":"int a;","class":"lineCov","hits":"1",},
{"lineNum":"    2","line":"int b;","class":"lineCov","hits":"1",},
];
var percent_low = 25;var percent_high = 75;
var header = { "command" : "t", "date" : "2024-01-01 00:00:00", "instrumented" : 2, "covered" : 2,};
var merged_data = [];
"#;

    fn kcov_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.json"), INDEX).unwrap();
        fs::write(dir.path().join("a.c.1.json"), SOURCE).unwrap();
        fs::create_dir_all(dir.path().join("skipped")).unwrap();
        fs::write(dir.path().join("skipped/index.json"), INDEX).unwrap();
        dir
    }

    #[test]
    fn test_parse_limits_arg() {
        assert_eq!(parse_limits_arg("10,90").unwrap().percent_high, 90.0);
        assert!(parse_limits_arg("90,10").is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("out/main.c.4f2c.json")),
            PathBuf::from("out/main.c.4f2c.html")
        );
        assert_eq!(
            default_output(Path::new("out/index.json")),
            PathBuf::from("out/index.html")
        );
    }

    #[test]
    fn test_write_html_report_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/index.html");
        write_html_report(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
        assert!(!path.with_extension("html.tmp").exists());
    }

    #[test]
    fn test_build_renders_every_page() {
        let dir = kcov_dir();
        let out = tempfile::tempdir().unwrap();
        let resolved = ResolvedConfig::defaults().unwrap();

        let summary = build_reports(dir.path(), out.path(), &resolved, true).unwrap();
        assert_eq!(summary.written, 3);
        assert!(summary.failed.is_empty());

        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(index.contains("tablesorter("));
        let source = fs::read_to_string(out.path().join("a.c.1.html")).unwrap();
        assert!(source.contains("<pre>int b;</pre>"));
        assert!(!source.contains("tablesorter("));
    }

    #[test]
    fn test_page_data_names() {
        assert!(is_page_data_name("index.json"));
        assert!(is_page_data_name("main.c.4f2c.json"));
        assert!(is_page_data_name("a.c.1.json"));
        assert!(!is_page_data_name("coverage.json"));
        assert!(!is_page_data_name("codecov.json"));
        assert!(!is_page_data_name("x.zz.json"));
        assert!(!is_page_data_name(".1f.json"));
        assert!(!is_page_data_name("main.c.4f2c.html"));
    }

    #[test]
    fn test_build_skips_non_page_json() {
        let dir = kcov_dir();
        fs::write(dir.path().join("coverage.json"), r#"{"percent_covered": "50.0"}"#).unwrap();
        fs::write(dir.path().join("codecov.json"), r#"{"coverage": {}}"#).unwrap();
        let out = tempfile::tempdir().unwrap();
        let resolved = ResolvedConfig::defaults().unwrap();

        let files = find_data_files(dir.path(), &resolved);
        assert!(!files.iter().any(|f| f == Path::new("coverage.json")));
        assert!(!files.iter().any(|f| f == Path::new("codecov.json")));

        let summary = build_reports(dir.path(), out.path(), &resolved, true).unwrap();
        assert_eq!(summary.written, 3);
        assert!(summary.failed.is_empty());
        assert!(!out.path().join("coverage.html").exists());
    }

    #[test]
    fn test_build_honors_excludes() {
        let dir = kcov_dir();
        let cfg_dir = tempfile::tempdir().unwrap();
        let cfg = cfg_dir.path().join("cfg.json");
        fs::write(&cfg, r#"{"exclude": ["skipped/**"]}"#).unwrap();
        let resolved = config::load_and_resolve(cfg_dir.path(), Some(&cfg)).unwrap();

        let files = find_data_files(dir.path(), &resolved);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.starts_with("skipped")));

        let out = tempfile::tempdir().unwrap();
        let summary = build_reports(dir.path(), out.path(), &resolved, true).unwrap();
        assert_eq!(summary.written, 2);
        assert!(summary.failed.is_empty());
        assert!(!out.path().join("skipped/index.html").exists());
    }

    #[test]
    fn test_page_kind() {
        assert!(page_kind(Path::new("sub/index.json")) == PageKind::Index);
        assert!(page_kind(Path::new("main.c.json")) == PageKind::Source);
    }

    #[test]
    fn test_render_config_lists_settings() {
        let text = render_config(&ResolvedConfig::defaults().unwrap());
        assert!(text.contains("defaults (no config file found)"));
        assert!(text.contains("from page data"));
        assert!(text.contains("theme: blue"));
        assert!(text.contains("initial column: 1"));
    }
}
