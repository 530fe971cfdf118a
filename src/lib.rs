//! # SST Auditor
//!
//! Occupational-safety (SST) compliance toolkit for Brazilian workplaces.
//!
//! SST Auditor sizes fire brigades (NBR 14276), CIPA commissions (NR-05) and
//! SESMT teams (NR-04) from static regulatory tables, serves NR audit
//! checklists, indexes regulation documents for keyword search, and renders
//! calculation and checklist results as PDF reports. Everything is exposed
//! through a CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Sources    │──▶│  Extract    │──▶│  SQLite  │
//! │ Dir/Remote  │   │ PDF / text  │   │  FTS5    │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │ search
//! ┌─────────────┐   ┌─────────────┐        │
//! │   Tables    │──▶│   Sizing    │──┐     │
//! │ TOML/builtin│   │ brigade/... │  │     │
//! └─────────────┘   └─────────────┘  ▼     ▼
//!                               ┌──────────────────┐
//!                               │  CLI (sst) / HTTP│──▶ Report (PDF)
//!                               └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Domain error taxonomy |
//! | [`models`] | Core data types |
//! | [`checklists`] | Built-in NR audit checklists |
//! | [`tables`] | Regulatory tables and lookups |
//! | [`sizing`] | Brigade, CIPA and SESMT calculators |
//! | [`sources`] | Document sources (directory, remote URLs) |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`ingest`] | Index builder |
//! | [`search`] | Keyword search |
//! | [`stats`] | Index statistics |
//! | [`report`] | PDF report layout and rendering |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod checklists;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod report;
pub mod search;
pub mod server;
pub mod sizing;
pub mod sources;
pub mod stats;
pub mod tables;
