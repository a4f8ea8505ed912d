pub mod error;

pub use error::{InferenceError, Result};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which inference endpoint a media URL is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Image => "infer-image",
            MediaKind::Video => "infer-video",
        }
    }

    fn payload(self, media_url: &str) -> serde_json::Value {
        match self {
            MediaKind::Image => serde_json::json!({ "imageUrl": media_url }),
            MediaKind::Video => serde_json::json!({ "videoUrl": media_url }),
        }
    }
}

/// Response body of `/infer-image` and `/infer-video`.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceResponse {
    #[serde(default = "neutral_score")]
    pub score: f64,
    #[serde(rename = "confidenceBand", default = "low_band")]
    pub confidence_band: String,
    #[serde(default)]
    pub reason: Option<String>,
}

fn neutral_score() -> f64 {
    0.5
}

fn low_band() -> String {
    "low".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct HealthResponse {
    ok: bool,
}

pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Score a media URL. The service downloads and analyzes the media itself.
    pub async fn infer(&self, media_url: &str, kind: MediaKind) -> Result<InferenceResponse> {
        let endpoint = format!("{}/{}", self.base_url, kind.endpoint());

        let resp = self
            .client
            .post(&endpoint)
            .json(&kind.payload(media_url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let parsed: InferenceResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            media_url,
            ?kind,
            score = parsed.score,
            band = %parsed.confidence_band,
            "Inference complete"
        );
        Ok(parsed)
    }

    /// Liveness probe against `/health`.
    pub async fn health(&self) -> Result<bool> {
        let endpoint = format!("{}/health", self.base_url);
        let resp = self.client.get(&endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: HealthResponse = serde_json::from_str(&resp.text().await?)?;
        Ok(body.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_key_follows_media_kind() {
        assert_eq!(
            MediaKind::Image.payload("https://x.test/a.png")["imageUrl"],
            "https://x.test/a.png"
        );
        assert_eq!(
            MediaKind::Video.payload("https://x.test/v")["videoUrl"],
            "https://x.test/v"
        );
        assert_eq!(MediaKind::Image.endpoint(), "infer-image");
        assert_eq!(MediaKind::Video.endpoint(), "infer-video");
    }

    #[test]
    fn response_defaults_when_fields_missing() {
        let resp: InferenceResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.score, 0.5);
        assert_eq!(resp.confidence_band, "low");
        assert!(resp.reason.is_none());
    }

    #[test]
    fn response_full_body() {
        let resp: InferenceResponse = serde_json::from_str(
            r#"{"score":0.83,"confidenceBand":"high","reason":"Used ONNX image model inference."}"#,
        )
        .unwrap();
        assert_eq!(resp.score, 0.83);
        assert_eq!(resp.confidence_band, "high");
    }

    #[test]
    fn trailing_slash_trimmed() {
        let client = InferenceClient::new("http://localhost:8010/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8010");
    }
}
