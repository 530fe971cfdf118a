//! Document sources feeding the regulation index.
//!
//! A [`DocumentSource`] yields raw documents (bytes plus content type).
//! Per-document failures come back as [`SstError::ExternalResourceUnavailable`]
//! entries so the ingest pipeline can log them and carry on; only a broken
//! source configuration fails the whole call.

use anyhow::Result;
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::SstError;
use crate::extract::content_type_for;
use crate::models::SourceKind;

/// A fetched document, before text extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub kind: SourceKind,
    pub title: String,
    pub locator: Option<String>,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub type FetchOutcome = Result<RawDocument, SstError>;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<FetchOutcome>>;
}

/// Local directory walked recursively and filtered by include globs.
pub struct DirectorySource {
    root: PathBuf,
    include: GlobSet,
    static_prefix: String,
}

impl DirectorySource {
    pub fn new(root: PathBuf, include_globs: &[String], static_prefix: &str) -> Result<Self> {
        Ok(Self {
            root,
            include: build_globset(include_globs)?,
            static_prefix: static_prefix.trim_end_matches('/').to_string(),
        })
    }

    fn read_entry(&self, path: &std::path::Path, rel: &str) -> FetchOutcome {
        let content_type = content_type_for(rel).ok_or_else(|| {
            SstError::ExternalResourceUnavailable(format!("{}: unknown file type", rel))
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            SstError::ExternalResourceUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| rel.to_string());

        Ok(RawDocument {
            kind: SourceKind::Directory,
            title,
            locator: Some(format!("{}/{}", self.static_prefix, rel)),
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    async fn fetch(&self) -> Result<Vec<FetchOutcome>> {
        if !self.root.is_dir() {
            warn!(root = %self.root.display(), "document directory not found");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    entries.push(Err(SstError::ExternalResourceUnavailable(e.to_string())));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            // URL paths use forward slashes on every platform.
            let rel_str = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if !self.include.is_match(&rel_str) {
                debug!(file = %rel_str, "not matched by include globs");
                continue;
            }
            entries.push(self.read_entry(path, &rel_str));
        }

        Ok(entries)
    }
}

/// Documents downloaded over HTTP(S), one per configured URL.
pub struct RemoteSource {
    urls: Vec<String>,
    client: reqwest::Client,
}

impl RemoteSource {
    pub fn new(urls: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { urls, client })
    }

    async fn fetch_one(&self, url: &str) -> FetchOutcome {
        let unavailable = |reason: String| {
            SstError::ExternalResourceUnavailable(format!("{}: {}", url, reason))
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        let content_type = match header_type.as_deref() {
            Some(t) if t.starts_with(crate::extract::MIME_PDF) => crate::extract::MIME_PDF,
            Some(t) if t.starts_with(crate::extract::MIME_TEXT) => crate::extract::MIME_TEXT,
            _ => content_type_for(url).unwrap_or(crate::extract::MIME_PDF),
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(RawDocument {
            kind: SourceKind::Remote,
            title: title_from_url(url),
            locator: Some(url.to_string()),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[async_trait]
impl DocumentSource for RemoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn describe(&self) -> String {
        format!("{} remote url(s)", self.urls.len())
    }

    async fn fetch(&self) -> Result<Vec<FetchOutcome>> {
        let mut entries = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            entries.push(self.fetch_one(url).await);
        }
        Ok(entries)
    }
}

/// Last non-empty path segment, without query string.
pub fn title_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or(url)
        .to_string()
}

/// Sources configured in `[index]`: the local directory, then remote URLs.
pub fn configured_sources(config: &Config) -> Result<Vec<Box<dyn DocumentSource>>> {
    let mut sources: Vec<Box<dyn DocumentSource>> = vec![Box::new(DirectorySource::new(
        config.index.pdf_dir.clone(),
        &config.index.include_globs,
        &config.server.static_prefix,
    )?)];
    if !config.index.remote_urls.is_empty() {
        sources.push(Box::new(RemoteSource::new(
            config.index.remote_urls.clone(),
            Duration::from_secs(config.index.fetch_timeout_secs),
        )?));
    }
    Ok(sources)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
