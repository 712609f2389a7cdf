//! Paced, retrying page retrieval.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::html::Document;

/// Statuses worth retrying: rate limiting and transient server failures.
const RETRY_STATUS: &[u16] = &[429, 500, 502, 503, 504];

const USER_AGENT: &str = concat!("wiki2rdf/", env!("CARGO_PKG_VERSION"));

/// Where pages come from. The crawler only sees this trait, so tests feed it
/// canned documents and never touch the network.
pub trait PageSource {
    fn fetch(&mut self, url: &str) -> Result<Document, FetchError>;
}

/// Blocking HTTP fetcher with a minimum inter-request delay and bounded
/// exponential-backoff retries. One request is in flight at a time.
pub struct HttpFetcher {
    client: Client,
    delay: Duration,
    backoff: Duration,
    max_retries: u32,
    last_request: Option<Instant>,
}

impl HttpFetcher {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            delay: Duration::from_millis(cfg.request_delay_ms),
            backoff: Duration::from_millis(cfg.backoff_ms),
            max_retries: cfg.max_retries,
            last_request: None,
        })
    }

    /// Keep the polite request cadence toward the wiki.
    fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt)
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<Document, FetchError> {
        let mut attempt = 0u32;
        loop {
            self.pace();
            match self.client.get(url).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(Document::parse(response.text()?));
                    }
                    let code = status.as_u16();
                    if !RETRY_STATUS.contains(&code) {
                        return Err(FetchError::Status {
                            status: code,
                            url: url.to_string(),
                        });
                    }
                    if attempt >= self.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt + 1,
                            url: url.to_string(),
                        });
                    }
                    debug!(url, status = code, attempt, "retrying after backoff");
                    thread::sleep(self.backoff_delay(attempt));
                    attempt += 1;
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    warn!(url, attempt, "transient transport failure: {e}");
                    thread::sleep(self.backoff_delay(attempt));
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
