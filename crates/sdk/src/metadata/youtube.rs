use serde::Deserialize;
use url::Url;

use crate::cid::ServiceType;

use super::{MetadataService, VideoMetadata};

/// Default oEmbed endpoint of YouTube.
pub const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Resolves video titles with YouTube's oEmbed endpoint.
#[derive(Debug, Clone)]
pub struct YoutubeMetadataService {
    endpoint: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
}

impl YoutubeMetadataService {
    /// Create a service using the given oEmbed endpoint.
    pub fn try_new(endpoint: &str) -> crate::Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(crate::Error::custom)?;
        Ok(Self::with_client(endpoint, reqwest::Client::new()))
    }

    /// Create a service with a custom HTTP client.
    pub fn with_client(endpoint: Url, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    /// Create a service using [`DEFAULT_OEMBED_ENDPOINT`].
    pub fn from_default_endpoint() -> crate::Result<Self> {
        Self::try_new(DEFAULT_OEMBED_ENDPOINT)
    }

    /// Get the endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, id: &str) -> crate::Result<Url> {
        let watch_url = ServiceType::Youtube
            .watch_url(id)
            .ok_or_else(|| crate::Error::custom("youtube has no watch url"))?;
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("url", &watch_url)
            .append_pair("format", "json");
        Ok(url)
    }
}

impl MetadataService for YoutubeMetadataService {
    async fn request_metadata(&self, id: &str) -> crate::Result<VideoMetadata> {
        let url = self.request_url(id)?;
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let text = resp.text().await?;
        let body = serde_json::from_str::<OEmbedResponse>(&text)?;
        Ok(VideoMetadata { title: body.title })
    }
}
