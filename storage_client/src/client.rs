//! Supabase storage REST client.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Storage client configuration.
#[derive(Debug, Clone)]
pub struct StorageClientConfig {
    /// Base URL of the storage service (e.g. "https://xyz.supabase.co")
    pub base_url: String,
    /// Service key, sent as `apikey` and bearer token
    pub api_key: String,
    /// Bucket name
    pub bucket: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StorageClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            bucket: bucket.into(),
            timeout_secs: 30,
        }
    }
}

/// Object storage client.
pub struct StorageClient {
    client: reqwest::Client,
    config: StorageClientConfig,
}

impl StorageClient {
    pub fn new(config: StorageClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|e| Error::Other(format!("Invalid api key header: {}", e)))?,
        );

        let bearer = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| Error::Other(format!("Invalid auth header: {}", e)))?,
        );

        Ok(headers)
    }

    /// Download an object from the public endpoint.
    ///
    /// Returns `Ok(None)` when the object is missing (any non-200 status),
    /// so a first run against an empty bucket is not an error.
    pub async fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, self.config.bucket, path
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::debug!("Object {} not available (status {})", path, status);
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Upload an object with upsert semantics (overwrites an existing one).
    pub async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, path
        );

        let mut headers = self.auth_headers()?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .query(&[("upsert", "true")])
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(Error::Api {
            message,
            status: status.as_u16(),
        })
    }
}
