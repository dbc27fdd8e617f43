//! Configuration file support for covreport
//!
//! Loads report settings from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.covreportrc.json` in the working directory
//! 3. `covreport.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file
//! values, and config values take precedence over the page data.

use crate::classify::Thresholds;
use crate::sort::SortIntent;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Columns of the index table
pub const INDEX_COLUMNS: usize = 5;

const CONFIG_FILES: &[&str] = &[".covreportrc.json", "covreport.config.json"];

/// covreport configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovReportConfig {
    /// Coverage limits overriding the page data
    #[serde(default)]
    pub limits: Option<LimitConfig>,

    /// Table sorter theme (default: blue)
    #[serde(default)]
    pub theme: Option<String>,

    /// Index column sorted on first load (default: 1, coverage percent)
    #[serde(default)]
    pub sort_column: Option<usize>,

    /// Glob patterns for data files `build` skips
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Low/high coverage limits, in percent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitConfig {
    pub low: f64,
    pub high: f64,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Limits to force onto every page (None keeps the page's own)
    pub limits: Option<Thresholds>,
    pub theme: Option<String>,
    pub sort_column: Option<usize>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    pub exclude_patterns: Vec<String>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

fn validate_limits(low: f64, high: f64, what: &str) -> Result<()> {
    for (name, v) in [("low", low), ("high", high)] {
        if !(0.0..=100.0).contains(&v) {
            anyhow::bail!("{}.{} must be within 0..=100 (got {})", what, name, v);
        }
    }
    if low >= high {
        anyhow::bail!(
            "{}.low ({}) must be less than {}.high ({})",
            what,
            low,
            what,
            high
        );
    }
    Ok(())
}

impl CovReportConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref l) = self.limits {
            validate_limits(l.low, l.high, "limits")?;
        }

        if let Some(ref theme) = self.theme {
            if theme.trim().is_empty() {
                anyhow::bail!("theme must not be empty");
            }
        }

        if let Some(column) = self.sort_column {
            if column >= INDEX_COLUMNS {
                anyhow::bail!(
                    "sort_column must be less than {} (got {})",
                    INDEX_COLUMNS,
                    column
                );
            }
        }

        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.exclude {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        Ok(ResolvedConfig {
            limits: self.limits.as_ref().map(|l| Thresholds {
                percent_low: l.low,
                percent_high: l.high,
            }),
            theme: self.theme.clone(),
            sort_column: self.sort_column,
            exclude,
            exclude_patterns: self.exclude.clone(),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a data file should be skipped
    pub fn should_exclude(&self, path: &Path) -> bool {
        self.exclude.is_match(path.to_string_lossy().as_ref())
    }

    /// Sort intent for index pages
    pub fn sort_intent(&self) -> SortIntent {
        let mut intent = SortIntent::default();
        if let Some(ref theme) = self.theme {
            intent = intent.with_theme(theme.clone());
        }
        if let Some(column) = self.sort_column {
            intent = intent.with_initial_column(column);
        }
        intent
    }

    /// Apply CLI limits on top of the config file's
    pub fn with_limits(mut self, limits: Option<Thresholds>) -> Self {
        if limits.is_some() {
            self.limits = limits;
        }
        self
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        CovReportConfig::default().resolve()
    }
}

/// Parse a `low,high` limit pair as given on the command line
pub fn parse_limits(s: &str) -> Result<Thresholds> {
    let (low, high) = s
        .split_once(',')
        .with_context(|| format!("expected LOW,HIGH (got {:?})", s))?;
    let low: f64 = low
        .trim()
        .parse()
        .with_context(|| format!("invalid low limit: {:?}", low))?;
    let high: f64 = high
        .trim()
        .parse()
        .with_context(|| format!("invalid high limit: {:?}", high))?;
    validate_limits(low, high, "limits")?;
    Ok(Thresholds {
        percent_low: low,
        percent_high: high,
    })
}

/// Discover and load a config file from the working directory
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(CovReportConfig, PathBuf)>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<CovReportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: CovReportConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    tracing::info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config under `root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (CovReportConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
