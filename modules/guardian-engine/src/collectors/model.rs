use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use guardian_common::{ContentIdentity, Signal, Strength};
use inference_client::MediaKind;

use crate::traits::ModelInference;

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];
const UNAVAILABLE: &str = "Model service unavailable, using neutral model score.";

/// Image if the URL path ends in a known image extension, video otherwise.
/// Query strings and fragments are ignored.
pub fn media_kind(url: &str) -> MediaKind {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        MediaKind::Image
    } else {
        MediaKind::Video
    }
}

pub struct ModelCollector {
    inference: Arc<dyn ModelInference>,
    timeout: Duration,
}

impl ModelCollector {
    pub fn new(inference: Arc<dyn ModelInference>, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    pub async fn collect(&self, identity: &ContentIdentity) -> Signal {
        let url = identity.normalized_url.as_str();
        let kind = media_kind(url);

        let call = tokio::time::timeout(self.timeout, self.inference.infer(url, kind));
        match call.await {
            Ok(Ok(resp)) if resp.score.is_finite() => {
                let score = resp.score.clamp(0.0, 1.0);
                let strength = Strength::from_band(&resp.confidence_band);
                Signal::new(score, format!("Model score {score:.2} ({strength})."), strength)
            }
            Ok(Ok(resp)) => {
                warn!(
                    url,
                    collector = "model",
                    score = resp.score,
                    "Model returned a non-finite score"
                );
                Signal::neutral(UNAVAILABLE)
            }
            Ok(Err(e)) => {
                warn!(url, collector = "model", ?kind, error = %e, "Model inference failed");
                Signal::neutral(UNAVAILABLE)
            }
            Err(_) => {
                warn!(
                    url,
                    collector = "model",
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Model inference timed out"
                );
                Signal::neutral(UNAVAILABLE)
            }
        }
    }
}
