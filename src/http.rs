use crate::errors::FetchError;
use crate::models::TARGET_SYMBOL;
use crate::json::{DEFAULT_DEPTH_LIMIT, DEFAULT_SYMBOL_KEYS, describe_shape, find_all_markets_by_symbol};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

pub const IDENTIFYING_USER_AGENT: &str = "USD1-Snapshot/1.0 (Rust/reqwest)";

/// Exponential backoff: the wait before retry `n` is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up,
/// returning the last error.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::debug!("request failed: {e}, retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Headers some protocol APIs expect before they answer.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// JSON GET with retries and an identifying user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
    debug: bool,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            retry: RetryPolicy::default(),
            debug: false,
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log a structural preview of every response.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.get_json_with(url, &HeaderMap::new()).await
    }

    /// GET `url`; entries in `extra` replace the default header of the same name.
    pub async fn get_json_with(&self, url: &str, extra: &HeaderMap) -> Result<Value, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(IDENTIFYING_USER_AGENT));
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }

        let data = retry(self.retry, || {
            let request = self
                .client
                .get(url)
                .headers(headers.clone())
                .timeout(self.timeout);
            async move {
                let value = request
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Value>()
                    .await?;
                Ok::<_, FetchError>(value)
            }
        })
        .await?;

        if self.debug {
            self.trace_shape(url, &data);
        }

        Ok(data)
    }

    fn trace_shape(&self, url: &str, data: &Value) {
        let short: String = url.chars().take(80).collect();
        tracing::info!("[debug] response shape for {short}...");
        for line in describe_shape(data) {
            tracing::info!("{line}");
        }
        let matches = find_all_markets_by_symbol(
            data,
            TARGET_SYMBOL,
            DEFAULT_SYMBOL_KEYS,
            DEFAULT_DEPTH_LIMIT,
        );
        tracing::info!("[debug] {} entries tagged {}", matches.len(), TARGET_SYMBOL);
    }
}
