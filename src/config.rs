//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! [db]
//! path = "./data/sst.sqlite"
//!
//! [index]
//! pdf_dir = "./pdfs"
//! max_pages = 10
//! remote_urls = []
//!
//! [search]
//! max_results = 10
//!
//! [server]
//! bind = "0.0.0.0:10000"
//! static_prefix = "/pdfs"
//!
//! [[risk.prefixes]]
//! prefix = "41"
//! grade = 3
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/sst.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Local directory of regulation documents. Also served read-only
    /// under `[server].static_prefix`.
    #[serde(default = "default_pdf_dir")]
    pub pdf_dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    /// Only the first `max_pages` pages of each PDF are indexed.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default)]
    pub remote_urls: Vec<String>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub ingest_on_startup: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            pdf_dir: default_pdf_dir(),
            include_globs: default_include_globs(),
            max_pages: default_max_pages(),
            remote_urls: Vec::new(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            ingest_on_startup: true,
        }
    }
}

fn default_pdf_dir() -> PathBuf {
    PathBuf::from("./pdfs")
}
fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.pdf".to_string(),
        "**/*.txt".to_string(),
        "**/*.md".to_string(),
    ]
}
fn default_max_pages() -> usize {
    10
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: i64,
    /// Token window passed to FTS5 `snippet()`.
    #[serde(default = "default_snippet_tokens")]
    pub snippet_tokens: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            snippet_tokens: default_snippet_tokens(),
        }
    }
}

fn default_max_results() -> i64 {
    10
}
fn default_snippet_tokens() -> i64 {
    20
}

pub const MAX_SEARCH_RESULTS: i64 = 50;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_prefix: default_static_prefix(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:10000".to_string()
}
fn default_static_prefix() -> String {
    "/pdfs".to_string()
}

/// Activity-code (CNAE) to risk-grade classification.
#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    #[serde(default = "default_grade")]
    pub default_grade: u8,
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<RiskPrefix>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            default_grade: default_grade(),
            prefixes: default_prefixes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RiskPrefix {
    pub prefix: String,
    pub grade: u8,
}

fn default_grade() -> u8 {
    2
}

// CNAE division 41-43: construction.
fn default_prefixes() -> Vec<RiskPrefix> {
    ["41", "42", "43"]
        .iter()
        .map(|p| RiskPrefix {
            prefix: p.to_string(),
            grade: 3,
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TablesConfig {
    /// Optional TOML file replacing the built-in regulatory tables.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate index
    if config.index.max_pages == 0 {
        anyhow::bail!("index.max_pages must be > 0");
    }
    if config.index.fetch_timeout_secs == 0 {
        anyhow::bail!("index.fetch_timeout_secs must be > 0");
    }

    // Validate search
    if !(1..=MAX_SEARCH_RESULTS).contains(&config.search.max_results) {
        anyhow::bail!("search.max_results must be in [1, {}]", MAX_SEARCH_RESULTS);
    }
    // FTS5 snippet() accepts at most 64 tokens.
    if !(1..=64).contains(&config.search.snippet_tokens) {
        anyhow::bail!("search.snippet_tokens must be in [1, 64]");
    }

    // Validate server
    if !config.server.static_prefix.starts_with('/') || config.server.static_prefix.len() < 2 {
        anyhow::bail!(
            "server.static_prefix must be an absolute path like \"/pdfs\", got '{}'",
            config.server.static_prefix
        );
    }

    // Validate risk classification
    if !(1..=4).contains(&config.risk.default_grade) {
        anyhow::bail!(
            "risk.default_grade must be in [1, 4], got {}",
            config.risk.default_grade
        );
    }
    for p in &config.risk.prefixes {
        // Codes are compared on digits only.
        if !p.prefix.chars().any(|c| c.is_ascii_digit()) {
            anyhow::bail!(
                "risk.prefixes entry '{}' must contain at least one digit",
                p.prefix
            );
        }
        if !(1..=4).contains(&p.grade) {
            anyhow::bail!(
                "risk.prefixes '{}' has grade {}; must be in [1, 4]",
                p.prefix,
                p.grade
            );
        }
    }

    Ok(())
}
