//! # SST Auditor CLI (`sst`)
//!
//! Command-line front end for the occupational-safety compliance service:
//! database setup, regulation indexing and search, fire-brigade / CIPA /
//! SESMT sizing, checklist listing, PDF reports, and the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! sst --config ./config/sst.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sst init` | Create the SQLite database and run schema migrations |
//! | `sst index [--rebuild]` | Build the regulation index from the configured sources |
//! | `sst stats` | Show index statistics |
//! | `sst search "<term>"` | Keyword search over indexed regulations |
//! | `sst checklists [--name <norm>]` | List checklists or the questions of one |
//! | `sst brigade` | Size a fire brigade (NBR 14276) |
//! | `sst cipa` | Size a CIPA commission (NR-05) |
//! | `sst sesmt` | Size a SESMT team (NR-04) |
//! | `sst report` | Render a PDF report from a JSON request |
//! | `sst serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Build the index once, offline
//! sst index --config ./config/sst.toml
//!
//! # Size a brigade and write its report
//! sst brigade --population 50 --division I-2 --report brigada.pdf \
//!     --meta client="Metalúrgica Alfa"
//!
//! # Checklist report from a saved request
//! sst report --request auditoria.json --out auditoria.pdf
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` filter);
//! command output goes to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use sst_auditor::config::{self, Config};
use sst_auditor::db;
use sst_auditor::error::SstError;
use sst_auditor::ingest::{run_ingest, IngestMode};
use sst_auditor::migrate::run_migrations;
use sst_auditor::models::{CalculationResult, ReportRequest};
use sst_auditor::report::render_report;
use sst_auditor::search::search_documents;
use sst_auditor::server;
use sst_auditor::sizing::{size_brigade, size_cipa, size_sesmt, RiskClassifier};
use sst_auditor::stats;
use sst_auditor::tables::TableStore;

/// SST Auditor CLI: workplace-safety sizing, checklists, regulation search
/// and PDF reports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/sst.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "sst",
    about = "SST Auditor: occupational-safety sizing, checklists, regulation search and PDF reports",
    version,
    long_about = "SST Auditor sizes fire brigades (NBR 14276), CIPA commissions (NR-05) and \
    SESMT teams (NR-04), serves audit checklists, indexes regulation documents for keyword \
    search, and renders PDF reports, from the command line or over an HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/sst.toml`. Database, index, search, server,
    /// risk-classification and table settings are read from this file.
    #[arg(long, global = true, default_value = "./config/sst.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the document and FTS tables.
    /// Running it again is safe.
    Init,

    /// Build the regulation index.
    ///
    /// Reads the local document directory and the configured remote URLs,
    /// extracts text and writes searchable records. An index that already
    /// has records is left alone unless `--rebuild` is given.
    Index {
        /// Drop every record and index from scratch.
        #[arg(long)]
        rebuild: bool,
    },

    /// Show index statistics.
    Stats,

    /// Keyword search over indexed regulations.
    ///
    /// Every word is matched as a prefix, accents are ignored.
    Search {
        /// Search term.
        term: String,

        /// Maximum number of results (capped at 50).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// List checklists, or the questions of one.
    Checklists {
        /// Checklist name, e.g. `"NR-35: Trabalho em Altura"`.
        #[arg(long)]
        name: Option<String>,
    },

    /// Size a fire brigade (NBR 14276).
    Brigade {
        /// Fixed population of the building.
        #[arg(long)]
        population: i64,

        /// Occupancy division code, e.g. `I-2`.
        #[arg(long)]
        division: String,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Size a CIPA commission (NR-05).
    Cipa {
        #[command(flatten)]
        staffing: StaffingArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Size a SESMT team (NR-04, Quadro II).
    Sesmt {
        #[command(flatten)]
        staffing: StaffingArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Render a PDF report from a JSON request file.
    ///
    /// The file holds `{"kind", "metadata", "payload"}`, the same body the
    /// HTTP `/report` endpoint accepts.
    Report {
        /// JSON request file.
        #[arg(long)]
        request: PathBuf,

        /// Output PDF path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind`. With `[index].ingest_on_startup` the index
    /// is built in the background.
    Serve,
}

/// Inputs shared by `cipa` and `sesmt`.
#[derive(clap::Args)]
struct StaffingArgs {
    /// CNAE activity code, e.g. `41.20-4`.
    #[arg(long)]
    activity: String,

    /// Number of employees.
    #[arg(long)]
    employees: i64,

    /// Risk grade 1-4, overriding the activity classification.
    #[arg(long)]
    risk_grade: Option<i64>,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Also render the result as a PDF report at this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Report metadata as `key=value` pairs (client, project, auditor, sector).
    #[arg(long = "meta", value_parser = parse_key_val)]
    meta: Vec<(String, String)>,
}

/// Parse a `key=value` pair for `--meta` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Report rendering needs no configuration.
    if let Commands::Report { request, out } = &cli.command {
        return run_report(request, out);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Index { rebuild } => {
            let mode = if rebuild {
                IngestMode::Rebuild
            } else {
                IngestMode::Incremental
            };
            let pool = db::connect(&cfg).await?;
            run_migrations(&pool).await?;
            let report = run_ingest(&cfg, &pool, mode).await?;
            pool.close().await;

            if report.skipped {
                println!("Index already populated; use --rebuild to index again.");
            } else {
                println!("Index built.");
                println!("  documents seen:    {}", report.documents_seen);
                println!("  documents indexed: {}", report.documents_indexed);
                println!("  documents failed:  {}", report.documents_failed);
                println!("  duplicates:        {}", report.duplicates);
                println!("  records written:   {}", report.records_written);
                if report.used_backup {
                    println!("  (backup corpus used)");
                }
            }
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Search { term, limit } => {
            run_search(&cfg, &term, limit).await?;
        }
        Commands::Checklists { name } => {
            let tables = load_tables(&cfg)?;
            match name {
                Some(name) => {
                    let items = tables.checklist_items(&name);
                    if items.is_empty() {
                        println!("No checklist named '{}'.", name);
                    }
                    for (i, item) in items.iter().enumerate() {
                        println!("{:>2}. {}", i + 1, item);
                    }
                }
                None => {
                    for name in tables.list_checklists() {
                        println!("{}", name);
                    }
                }
            }
        }
        Commands::Brigade {
            population,
            division,
            report,
        } => {
            let tables = load_tables(&cfg)?;
            let result = size_brigade(&tables, population, &division)?;
            print_json(&result)?;
            write_result_report(&CalculationResult::Brigade(result), report)?;
        }
        Commands::Cipa { staffing, report } => {
            let tables = load_tables(&cfg)?;
            let classifier = RiskClassifier::new(&cfg.risk);
            let result = size_cipa(
                &tables,
                &classifier,
                &staffing.activity,
                staffing.employees,
                staffing.risk_grade,
            )?;
            print_json(&result)?;
            write_result_report(&CalculationResult::Cipa(result), report)?;
        }
        Commands::Sesmt { staffing, report } => {
            let tables = load_tables(&cfg)?;
            let classifier = RiskClassifier::new(&cfg.risk);
            let result = size_sesmt(
                &tables,
                &classifier,
                &staffing.activity,
                staffing.employees,
                staffing.risk_grade,
            )?;
            print_json(&result)?;
            write_result_report(&CalculationResult::Sesmt(result), report)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Report { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

fn load_tables(cfg: &Config) -> Result<TableStore> {
    TableStore::from_config(&cfg.tables).context("Regulatory tables failed validation")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_search(cfg: &Config, term: &str, limit: Option<i64>) -> Result<()> {
    let pool = db::connect(cfg).await?;
    run_migrations(&pool).await?;
    let hits = search_documents(&pool, &cfg.search, term, limit).await?;
    pool.close().await;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let page = hit.page.map(|p| format!(" p.{}", p)).unwrap_or_default();
        println!("{}. [{:.2}] {}{}", i + 1, hit.score, hit.title, page);
        if let Some(locator) = &hit.locator {
            println!("    {}", locator);
        }
        println!("    {}", hit.snippet);
    }
    Ok(())
}

fn write_result_report(result: &CalculationResult, args: ReportArgs) -> Result<()> {
    let Some(out) = args.report else {
        return Ok(());
    };
    let metadata = args
        .meta
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::String(v)))
        .collect();
    let request = ReportRequest::from_result(result, metadata);
    write_pdf(&request, &out)
}

fn run_report(request_path: &Path, out: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read report request: {}", request_path.display()))?;
    let request: ReportRequest = serde_json::from_str(&raw)
        .map_err(|e| SstError::invalid(format!("malformed report request: {}", e)))?;
    write_pdf(&request, out)
}

fn write_pdf(request: &ReportRequest, out: &Path) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let bytes = render_report(request, today)?;
    std::fs::write(out, &bytes)
        .with_context(|| format!("Failed to write report: {}", out.display()))?;
    println!("Report written to {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}
