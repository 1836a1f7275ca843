//! Reachability probing for `active_url`
//!
//! The engine only knows the [`UrlProbe`] trait. [`NoProbe`] is installed by
//! default and accepts every well-formed URL; [`HttpProbe`] (feature
//! `http-probe`) issues a `HEAD` request bounded by the configured timeout.

use std::fmt::Debug;

use async_trait::async_trait;

/// Decides whether a URL answers.
#[async_trait]
pub trait UrlProbe: Send + Sync + Debug {
    async fn reachable(&self, url: &str) -> bool;
}

/// Probe that never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

#[async_trait]
impl UrlProbe for NoProbe {
    async fn reachable(&self, _url: &str) -> bool {
        true
    }
}

#[cfg(feature = "http-probe")]
pub use http::HttpProbe;

#[cfg(feature = "http-probe")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use tracing::debug;

    use super::UrlProbe;

    /// `HEAD` request probe. Any response below 500 counts as reachable.
    #[derive(Debug, Clone)]
    pub struct HttpProbe {
        client: reqwest::Client,
        timeout: Duration,
    }

    impl HttpProbe {
        pub fn new(timeout: Duration) -> Self {
            Self {
                client: reqwest::Client::new(),
                timeout,
            }
        }

        pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
            Self { client, timeout }
        }
    }

    #[async_trait]
    impl UrlProbe for HttpProbe {
        async fn reachable(&self, url: &str) -> bool {
            let request = self.client.head(url).send();
            match tokio::time::timeout(self.timeout, request).await {
                Ok(Ok(response)) => !response.status().is_server_error(),
                Ok(Err(e)) => {
                    debug!(url, error = %e, "probe request failed");
                    false
                }
                Err(_) => {
                    debug!(url, timeout_ms = self.timeout.as_millis() as u64, "probe timed out");
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_probe_accepts_everything() {
        assert!(NoProbe.reachable("https://example.invalid").await);
    }

    #[cfg(feature = "http-probe")]
    #[tokio::test]
    async fn test_http_probe_rejects_unroutable_host() {
        let probe = HttpProbe::new(std::time::Duration::from_millis(200));
        assert!(!probe.reachable("http://127.0.0.1:9").await);
    }
}
