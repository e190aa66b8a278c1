//! HTTP connectivity probe against the practice server

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::ConnectivityProbe;

/// Probe timeout, tight because the check runs on every poll
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probe that pings the server's health endpoint.
///
/// Any HTTP response counts as reachable, including errors: a 500
/// still proves the network path works, and the drain itself decides
/// what to do with an unhealthy server.
pub struct HttpProbe {
    health_url: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self {
            health_url: format!("{}/api/health", base),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn check(&self) -> bool {
        self.client
            .get(&self.health_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .is_ok()
    }
}
