use anyhow::Result;
use sqlx::SqlitePool;

/// Create the index schema. Safe to run on every start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // One row per indexed record (a PDF page or a whole text document).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            locator TEXT,
            page INTEGER,
            content_hash TEXT NOT NULL,
            indexed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='documents_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        // remove_diacritics lets "protecao" match "Proteção".
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE documents_fts USING fts5(
                doc_id UNINDEXED,
                title,
                body,
                tokenize = 'unicode61 remove_diacritics 2'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source)")
        .execute(pool)
        .await?;

    Ok(())
}
