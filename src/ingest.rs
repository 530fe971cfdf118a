//! Ingestion pipeline: sources → text extraction → SQLite FTS5 index.
//!
//! The index is built once. When it already holds records an incremental
//! run is a no-op; [`IngestMode::Rebuild`] clears it first. Documents that
//! cannot be fetched or parsed are logged and skipped. If nothing at all
//! could be indexed, a small built-in backup corpus is written so search
//! still answers for the core norms.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::extract::{content_hash, extract_pages_blocking};
use crate::models::{IndexedDocument, SourceKind};
use crate::sources::{configured_sources, DocumentSource};

/// Written when no source produced any record.
pub const BACKUP_CORPUS: [(&str, &str); 3] = [
    (
        "NR-06.pdf",
        "Equipamento de Proteção Individual EPI Capacete Luva",
    ),
    (
        "NR-10.pdf",
        "Segurança em Instalações Elétricas Bloqueio LOTO",
    ),
    (
        "NR-35.pdf",
        "Trabalho em Altura Cinto Paraquedista Ancoragem",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Build only if the index is empty.
    Incremental,
    /// Drop every record and build from scratch.
    Rebuild,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// The index already had records; nothing was done.
    pub skipped: bool,
    pub documents_seen: usize,
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub duplicates: usize,
    pub records_written: usize,
    pub used_backup: bool,
}

/// Ingest from the sources configured in `[index]`.
pub async fn run_ingest(config: &Config, pool: &SqlitePool, mode: IngestMode) -> Result<IngestReport> {
    let sources = configured_sources(config)?;
    ingest_from(pool, &sources, config.index.max_pages, mode).await
}

pub async fn ingest_from(
    pool: &SqlitePool,
    sources: &[Box<dyn DocumentSource>],
    max_pages: usize,
    mode: IngestMode,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    match mode {
        IngestMode::Rebuild => clear_index(pool).await?,
        IngestMode::Incremental => {
            let existing = record_count(pool).await?;
            if existing > 0 {
                info!(records = existing, "index already populated, skipping ingest");
                report.skipped = true;
                return Ok(report);
            }
        }
    }

    let mut seen_hashes: HashSet<String> = HashSet::new();

    for source in sources {
        info!(kind = source.kind().as_str(), source = %source.describe(), "scanning");
        for outcome in source.fetch().await? {
            report.documents_seen += 1;
            let doc = match outcome {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(error = %e, "skipping document");
                    report.documents_failed += 1;
                    continue;
                }
            };

            let hash = content_hash(&doc.bytes);
            if !seen_hashes.insert(hash.clone()) {
                info!(title = %doc.title, "duplicate content, indexed once");
                report.duplicates += 1;
                continue;
            }

            let pages = match extract_pages_blocking(doc.bytes, doc.content_type, max_pages).await
            {
                Ok(pages) => pages,
                Err(e) => {
                    warn!(title = %doc.title, error = %e, "skipping document");
                    report.documents_failed += 1;
                    continue;
                }
            };
            if pages.is_empty() {
                warn!(title = %doc.title, "no extractable text, skipping document");
                report.documents_failed += 1;
                continue;
            }

            let records: Vec<IndexedDocument> = pages
                .into_iter()
                .map(|(page, body)| IndexedDocument {
                    title: doc.title.clone(),
                    body,
                    locator: doc.locator.clone(),
                    page,
                })
                .collect();
            insert_records(pool, doc.kind, &hash, &records).await?;
            report.documents_indexed += 1;
            report.records_written += records.len();
        }
    }

    if report.records_written == 0 {
        warn!("no documents indexed, writing backup corpus");
        for (title, body) in BACKUP_CORPUS {
            let record = IndexedDocument {
                title: title.to_string(),
                body: body.to_string(),
                locator: None,
                page: None,
            };
            insert_records(
                pool,
                SourceKind::Backup,
                &content_hash(body.as_bytes()),
                std::slice::from_ref(&record),
            )
            .await?;
            report.records_written += 1;
        }
        report.used_backup = true;
    }

    info!(
        indexed = report.documents_indexed,
        failed = report.documents_failed,
        records = report.records_written,
        "ingest complete"
    );
    Ok(report)
}

/// Number of searchable records.
pub async fn record_count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn clear_index(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM documents_fts")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM documents").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

async fn insert_records(
    pool: &SqlitePool,
    kind: SourceKind,
    hash: &str,
    records: &[IndexedDocument],
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    for record in records {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (id, source, title, body, locator, page, content_hash, indexed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(kind.as_str())
        .bind(&record.title)
        .bind(&record.body)
        .bind(&record.locator)
        .bind(record.page.map(i64::from))
        .bind(hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO documents_fts (doc_id, title, body) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(&record.title)
            .bind(&record.body)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
