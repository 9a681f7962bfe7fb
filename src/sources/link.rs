use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::LinkChecker;

/// HEAD request (GET when HEAD is refused); 2xx/3xx count as live.
#[derive(Clone)]
pub struct HttpLinkChecker {
    client: Client,
    timeout: Duration,
}

impl HttpLinkChecker {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    async fn status(&self, method: Method, url: &str) -> Option<StatusCode> {
        match self
            .client
            .request(method, url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(rsp) => Some(rsp.status()),
            Err(e) => {
                debug!(%url, error = %e, "link check failed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn is_live(&self, url: &str) -> bool {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return false;
        }
        let status = match self.status(Method::HEAD, url).await {
            Some(StatusCode::METHOD_NOT_ALLOWED) => self.status(Method::GET, url).await,
            other => other,
        };
        status.is_some_and(|s| s.is_success() || s.is_redirection())
    }
}
