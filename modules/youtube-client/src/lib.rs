pub mod error;
pub mod types;

pub use error::{Result, YoutubeError};
pub use types::{
    ChannelItem, ChannelSnippet, ListResponse, SyntheticDisclosure, VideoSnippet,
    VideoSnippetItem, VideoStatus, VideoStatusItem,
};

use std::time::Duration;

use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

pub struct YoutubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch the synthetic-media disclosure flag for a video.
    /// A video the API doesn't know about reports `Unknown`.
    pub async fn synthetic_disclosure(&self, video_id: &str) -> Result<SyntheticDisclosure> {
        let resp: ListResponse<VideoStatusItem> =
            self.list("videos", "status", video_id).await?;

        let flag = resp
            .items
            .into_iter()
            .next()
            .and_then(|item| item.status)
            .and_then(|status| status.contains_synthetic_media);

        tracing::debug!(video_id, ?flag, "Fetched YouTube disclosure status");
        Ok(SyntheticDisclosure::from_flag(flag))
    }

    /// Look up the channel that published a video.
    pub async fn channel_for_video(&self, video_id: &str) -> Result<Option<String>> {
        let resp: ListResponse<VideoSnippetItem> =
            self.list("videos", "snippet", video_id).await?;

        Ok(resp
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.channel_id))
    }

    /// Resolve a channel id to its public `@handle`.
    pub async fn channel_handle(&self, channel_id: &str) -> Result<Option<String>> {
        let resp: ListResponse<ChannelItem> = self.list("channels", "snippet", channel_id).await?;

        Ok(resp
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet)
            .and_then(|snippet| snippet.custom_url))
    }

    async fn list<T: DeserializeOwned>(&self, resource: &str, part: &str, id: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let resp = self
            .client
            .get(&url)
            .query(&[("part", part), ("id", id), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YoutubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
