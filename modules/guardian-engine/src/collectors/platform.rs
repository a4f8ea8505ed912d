use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use guardian_common::{ContentIdentity, Platform, Signal, Strength};

use crate::traits::DisclosureProvider;

/// Upper bound on the disclosure lookup.
pub const PLATFORM_TIMEOUT: Duration = Duration::from_secs(5);

const DECLARED_SCORE: f64 = 1.0;
const DENIED_SCORE: f64 = 0.2;

/// Platform disclosure metadata → Signal. Only YouTube publishes a
/// synthetic-media flag; every other platform gets the neutral signal.
pub struct PlatformCollector {
    provider: Option<Arc<dyn DisclosureProvider>>,
    timeout: Duration,
}

impl PlatformCollector {
    /// `provider` is `None` when no API credential is configured.
    pub fn new(provider: Option<Arc<dyn DisclosureProvider>>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout: timeout.min(PLATFORM_TIMEOUT),
        }
    }

    pub async fn collect(&self, identity: &ContentIdentity) -> Signal {
        if identity.platform != Platform::Youtube {
            return Signal::neutral(format!(
                "No strong platform disclosure available for {}.",
                identity.platform
            ));
        }

        let Some(provider) = &self.provider else {
            return Signal::neutral("YouTube API key not configured, platform signal unavailable.");
        };

        let video_id = identity.canonical_id.as_str();
        let lookup = tokio::time::timeout(self.timeout, provider.synthetic_disclosure(video_id));
        match lookup.await {
            Ok(Ok(Some(true))) => {
                debug!(video_id, "YouTube declares synthetic media");
                Signal::new(
                    DECLARED_SCORE,
                    "YouTube containsSyntheticMedia is true.",
                    Strength::High,
                )
            }
            Ok(Ok(Some(false))) => Signal::new(
                DENIED_SCORE,
                "YouTube containsSyntheticMedia is false.",
                Strength::High,
            ),
            Ok(Ok(None)) => {
                Signal::neutral("YouTube synthetic disclosure not available for this video.")
            }
            Ok(Err(e)) => {
                warn!(video_id, collector = "platform", error = %e, "Disclosure lookup failed");
                Signal::neutral("Could not fetch YouTube disclosure signal in time.")
            }
            Err(_) => {
                warn!(
                    video_id,
                    collector = "platform",
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Disclosure lookup timed out"
                );
                Signal::neutral("Could not fetch YouTube disclosure signal in time.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{identity, MockDisclosure};

    fn collector(mock: MockDisclosure) -> PlatformCollector {
        PlatformCollector::new(Some(Arc::new(mock)), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn declared_synthetic_scores_high() {
        let c = collector(MockDisclosure::new().on_video("vid1", Some(true)));
        let s = c.collect(&identity(Platform::Youtube, "vid1")).await;
        assert_eq!(s.score, 1.0);
        assert_eq!(s.strength, Strength::High);
    }

    #[tokio::test]
    async fn denied_synthetic_scores_low() {
        let c = collector(MockDisclosure::new().on_video("vid1", Some(false)));
        let s = c.collect(&identity(Platform::Youtube, "vid1")).await;
        assert_eq!(s.score, 0.2);
        assert_eq!(s.strength, Strength::High);
    }

    #[tokio::test]
    async fn unknown_flag_is_neutral() {
        let c = collector(MockDisclosure::new().on_video("vid1", None));
        let s = c.collect(&identity(Platform::Youtube, "vid1")).await;
        assert_eq!((s.score, s.strength), (0.5, Strength::Low));
    }

    #[tokio::test]
    async fn lookup_error_is_neutral() {
        let c = collector(MockDisclosure::new());
        let s = c.collect(&identity(Platform::Youtube, "unregistered")).await;
        assert_eq!((s.score, s.strength), (0.5, Strength::Low));
    }

    #[tokio::test]
    async fn timeout_is_neutral() {
        let c = collector(MockDisclosure::new().hanging());
        let s = c.collect(&identity(Platform::Youtube, "vid1")).await;
        assert_eq!((s.score, s.strength), (0.5, Strength::Low));
        assert!(s.message.contains("in time"));
    }

    #[tokio::test]
    async fn missing_credential_skips_lookup() {
        let c = PlatformCollector::new(None, PLATFORM_TIMEOUT);
        let s = c.collect(&identity(Platform::Youtube, "vid1")).await;
        assert_eq!((s.score, s.strength), (0.5, Strength::Low));
        assert!(s.message.contains("not configured"));
    }

    #[tokio::test]
    async fn other_platforms_never_call_provider() {
        let mock = Arc::new(MockDisclosure::new().on_video("abc", Some(true)));
        let c = PlatformCollector::new(Some(mock.clone()), PLATFORM_TIMEOUT);
        let s = c.collect(&identity(Platform::Tiktok, "abc")).await;
        assert_eq!(s.score, 0.5);
        assert!(s.message.contains("tiktok"));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn timeout_is_capped() {
        let c = PlatformCollector::new(None, Duration::from_secs(60));
        assert_eq!(c.timeout, PLATFORM_TIMEOUT);
    }
}
