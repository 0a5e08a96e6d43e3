use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, ClientBuilder, header};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::FetcherConfig;
use crate::extractor::js::host_in;
use crate::fetcher::{
    charset::decode_body,
    errors::FetchError,
    retry::backoff_delay,
    types::{FetchResult, PageResponse},
};

/// Sent instead of the configured agent to sites that serve bots an
/// empty shell.
pub const DESKTOP_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Anything that can turn a URL into a page. Never errors: failures come
/// back as [`FetchResult::Failed`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

pub fn build_client(config: &FetcherConfig) -> Result<Client, FetchError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static("en-US,en;q=0.5"),
    );

    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .map_err(|e| FetchError::Unknown(format!("failed to build http client: {e}")))
}

/// reqwest-backed fetcher with bounded exponential-backoff retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_with_retries(&self, url: &str) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return FetchResult::Failed {
                    error: e.into(),
                    attempts: 0,
                };
            }
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return FetchResult::Failed {
                error: FetchError::UnsupportedScheme(parsed.scheme().to_string()),
                attempts: 0,
            };
        }

        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(&parsed).await {
                Ok(page) => {
                    debug!(
                        attempt,
                        status = %page.status,
                        encoding = page.encoding,
                        bytes = page.body_raw.len(),
                        "fetched page"
                    );
                    return FetchResult::Success(page);
                }
                Err(error) if error.should_retry() && attempt < max_attempts => {
                    let delay = backoff_delay(attempt - 1, self.config.backoff_base);
                    warn!(
                        attempt,
                        max_attempts,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "fetch attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(error) => {
                    warn!(attempt, error = %error, "giving up on url");
                    return FetchResult::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<PageResponse, FetchError> {
        let mut request = self.client.get(url.clone());
        // Per request, so the client's default agent is untouched for the next URL
        if url
            .host_str()
            .is_some_and(|host| host_in(host, &self.config.js_only_hosts))
        {
            request = request.header(header::USER_AGENT, DESKTOP_BROWSER_USER_AGENT);
        }

        let response = request
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > self.config.max_body_bytes
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_raw = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing or wrong
        if body_raw.len() as u64 > self.config.max_body_bytes {
            return Err(FetchError::BodyTooLarge(body_raw.len() as u64));
        }

        let (body_utf8, encoding) = decode_body(&content_type, &body_raw);
        Ok(PageResponse {
            url_final,
            status,
            content_type,
            body_raw,
            body_utf8,
            encoding: encoding.name(),
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_retries(url).await
    }
}
