//! Image source adapter: where candidate wallpapers come from.

mod html;

pub use html::extract_image_urls;

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// One image selected for posting, bytes already in hand.
#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Seam between the orchestrator and whatever supplies the images.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Candidate image URLs in document order.
    async fn list_candidates(&self) -> Result<Vec<String>>;

    /// Raw bytes of a single image.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reads `<img>` URLs from a local HTML document and downloads the image
/// bytes over HTTP. The document itself is never modified.
pub struct HtmlFileSource {
    path: PathBuf,
    client: reqwest::Client,
}

impl HtmlFileSource {
    pub fn new(path: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }
}

impl ImageSource for HtmlFileSource {
    async fn list_candidates(&self) -> Result<Vec<String>> {
        let html = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read wallpapers document {:?}", self.path))?;
        Ok(extract_image_urls(&html))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download of {} returned status {}", url, status);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok(bytes.to_vec())
    }
}
