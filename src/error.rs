//! Error taxonomy for the crawler.
//!
//! Fetch errors are degradable: drivers log them and skip the title. Store
//! errors mean accumulated work could be lost and always terminate the run.

use thiserror::Error;

/// Errors raised while retrieving a page.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Non-retryable HTTP status (or a retryable one past the retry bound).
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Retries exhausted on a transient failure.
    #[error("gave up on {url} after {attempts} attempts")]
    RetriesExhausted { attempts: u32, url: String },

    /// Connection, TLS or timeout failure from the HTTP client.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors raised while saving or loading the graph snapshot.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed snapshot at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Top-level error for a crawl run.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    /// Only surfaced when the HTTP client itself cannot be constructed;
    /// per-page fetch failures never reach this level.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}
