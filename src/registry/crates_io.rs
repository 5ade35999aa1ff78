//! crates.io API adapter
//!
//! Fetches crate version information from crates.io.
//! API endpoint: https://crates.io/api/v1/crates/{crate}
//!
//! crates.io requires a User-Agent header (handled by HttpClient) and
//! rate limits API users to one request per second.

use crate::error::RegistryError;
use crate::registry::{HttpClient, RegistryAdapter};
use crate::update::VersionInfo;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// crates.io API base URL
const CRATES_IO_API_URL: &str = "https://crates.io/api/v1/crates";

/// Rate limit: 1 request per second
const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

/// crates.io adapter with rate limiting
pub struct CratesIoAdapter {
    client: HttpClient,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

/// crates.io crate response
#[derive(Debug, Deserialize)]
struct CratesIoResponse {
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    created_at: String,
    yanked: bool,
}

impl CratesIoAdapter {
    /// Create a new crates.io adapter
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, CRATES_IO_API_URL)
    }

    /// Create an adapter for a crates.io-compatible API at `base_url`
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            last_request: Mutex::new(None),
        }
    }

    fn build_url(&self, crate_name: &str) -> String {
        format!("{}/{}", self.base_url, crate_name)
    }

    /// Waits until a request is allowed, then records it
    async fn apply_rate_limit(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                tokio::time::sleep(RATE_LIMIT_INTERVAL - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

/// Converts a crates.io response into sorted, non-yanked versions
fn collect_versions(response: CratesIoResponse) -> Vec<VersionInfo> {
    let mut versions: Vec<VersionInfo> = response
        .versions
        .into_iter()
        .filter(|v| !v.yanked)
        .filter_map(|v| {
            let released_at = v.created_at.parse::<DateTime<Utc>>().ok()?;
            Some(VersionInfo::new(v.num, released_at))
        })
        .collect();
    versions.sort();
    versions
}

#[async_trait]
impl RegistryAdapter for CratesIoAdapter {
    fn registry_name(&self) -> &'static str {
        "crates.io"
    }

    async fn fetch_versions(&self, crate_name: &str) -> Result<Vec<VersionInfo>, RegistryError> {
        self.apply_rate_limit().await;

        let url = self.build_url(crate_name);
        let response: CratesIoResponse = self
            .client
            .get_json(&url, crate_name, self.registry_name())
            .await?;

        Ok(collect_versions(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crates_io_adapter_registry_name() {
        let client = HttpClient::new().unwrap();
        let adapter = CratesIoAdapter::new(client);
        assert_eq!(adapter.registry_name(), "crates.io");
    }

    #[test]
    fn test_build_url() {
        let client = HttpClient::new().unwrap();
        let adapter = CratesIoAdapter::new(client);
        assert_eq!(
            adapter.build_url("serde_json"),
            "https://crates.io/api/v1/crates/serde_json"
        );
    }

    #[test]
    fn test_build_url_custom_base() {
        let client = HttpClient::new().unwrap();
        let adapter = CratesIoAdapter::with_base_url(client, "http://localhost:8080/api/");
        assert_eq!(
            adapter.build_url("serde"),
            "http://localhost:8080/api/serde"
        );
    }

    #[test]
    fn test_collect_versions_skips_yanked_and_sorts() {
        let response: CratesIoResponse = serde_json::from_str(
            r#"{"versions": [
                {"num": "1.10.0", "created_at": "2024-03-01T00:00:00Z", "yanked": false},
                {"num": "1.9.0", "created_at": "2024-02-01T00:00:00Z", "yanked": false},
                {"num": "1.9.1", "created_at": "2024-02-10T00:00:00Z", "yanked": true},
                {"num": "1.2.0", "created_at": "not a date", "yanked": false}
            ]}"#,
        )
        .unwrap();

        let versions: Vec<String> = collect_versions(response)
            .into_iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(versions, vec!["1.9.0", "1.10.0"]);
    }

    #[tokio::test]
    async fn test_rate_limit_records_request() {
        let client = HttpClient::new().unwrap();
        let adapter = CratesIoAdapter::new(client);
        adapter.apply_rate_limit().await;
        assert!(adapter.last_request.lock().await.is_some());
    }
}
