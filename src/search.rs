//! Keyword search over the regulation index (SQLite FTS5, bm25 ranking).

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::{SearchConfig, MAX_SEARCH_RESULTS};
use crate::models::SearchHit;

/// Turn free text into an FTS5 MATCH expression.
///
/// Each Unicode alphanumeric run becomes a quoted prefix term and terms are
/// ANDed, so operator characters in user input never reach the FTS5 parser.
/// Returns `None` when the input holds no word at all.
pub fn normalize_query(term: &str) -> Option<String> {
    let tokens: Vec<String> = term
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"*", t))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" AND "))
    }
}

/// Search the index. `limit` overrides `max_results` and is capped at
/// [`MAX_SEARCH_RESULTS`].
pub async fn search_documents(
    pool: &SqlitePool,
    config: &SearchConfig,
    term: &str,
    limit: Option<i64>,
) -> Result<Vec<SearchHit>> {
    let Some(query) = normalize_query(term) else {
        return Ok(Vec::new());
    };
    let limit = limit
        .unwrap_or(config.max_results)
        .clamp(1, MAX_SEARCH_RESULTS);

    let rows = sqlx::query(
        r#"
        SELECT d.title, d.locator, d.page, documents_fts.rank AS rank,
               snippet(documents_fts, 2, '<b>', '</b>', '...', ?) AS snippet
        FROM documents_fts
        JOIN documents d ON d.id = documents_fts.doc_id
        WHERE documents_fts MATCH ?
        ORDER BY documents_fts.rank
        LIMIT ?
        "#,
    )
    .bind(config.snippet_tokens)
    .bind(&query)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let hits = rows
        .iter()
        .map(|row| {
            let rank: f64 = row.get("rank");
            let page: Option<i64> = row.get("page");
            SearchHit {
                title: row.get("title"),
                snippet: row.get("snippet"),
                locator: row.get("locator"),
                page: page.and_then(|p| u32::try_from(p).ok()),
                score: -rank, // negate so higher = better
            }
        })
        .collect();

    Ok(hits)
}
