//! Index statistics for `sst stats`.
//!
//! Shows how many searchable records came from each source kind and when
//! the index was last built, so an operator can tell whether the backup
//! corpus is what search is answering from.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate::run_migrations;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub source: String,
    pub documents: i64,
    pub records: i64,
    pub last_indexed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub total_records: i64,
    pub by_source: Vec<SourceStats>,
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<IndexStats> {
    let total_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        r#"
        SELECT
            source,
            COUNT(DISTINCT content_hash) AS documents,
            COUNT(*) AS records,
            MAX(indexed_at) AS last_indexed
        FROM documents
        GROUP BY source
        ORDER BY records DESC, source
        "#,
    )
    .fetch_all(pool)
    .await?;

    let by_source = rows
        .iter()
        .map(|row| SourceStats {
            source: row.get("source"),
            documents: row.get("documents"),
            records: row.get("records"),
            last_indexed: row.get("last_indexed"),
        })
        .collect();

    Ok(IndexStats {
        total_records,
        by_source,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    run_migrations(&pool).await?;
    let stats = collect_stats(&pool).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("SST Auditor — Index Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Records:     {}", stats.total_records);

    if !stats.by_source.is_empty() {
        println!();
        println!(
            "  {:<12} {:>6} {:>8}   {}",
            "SOURCE", "DOCS", "RECORDS", "INDEXED"
        );
        println!("  {}", "-".repeat(48));
        for s in &stats.by_source {
            let when = match s.last_indexed {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<12} {:>6} {:>8}   {}",
                s.source, s.documents, s.records, when
            );
        }
    }

    println!();
    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;
    match delta {
        d if d < 0 => format_ts_iso(ts),
        d if d < 60 => "just now".to_string(),
        d if d < 3600 => format!("{} min ago", d / 60),
        d if d < 86400 => format!("{} h ago", d / 3600),
        _ => format_ts_iso(ts),
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
