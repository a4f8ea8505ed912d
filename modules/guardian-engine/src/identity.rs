// Content identity: URL → (platform, canonical id, creator id).
//
// Resolution is total. When a platform id can't be parsed out of the URL the
// canonical id is a hash of the raw URL. When a creator can't be resolved the
// creator id is a placeholder derived from the content id, so every spelling
// of one video's URL lands on the same placeholder.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use guardian_common::{ContentIdentity, Platform};

use crate::traits::CreatorDirectory;

const YOUTUBE_CREATOR_PREFIX: &str = "youtube_creator_";
const INSTAGRAM_CREATOR_PREFIX: &str = "instagram_creator_";
const TIKTOK_CREATOR_PREFIX: &str = "tiktok_creator_";
const GENERIC_CREATOR_PREFIX: &str = "creator_";

/// Hex characters kept from the URL digest for fallback canonical ids.
const HASH_ID_LEN: usize = 16;
/// Hex characters kept from the URL digest for placeholder creator ids.
const HASH_CREATOR_LEN: usize = 8;

/// Stable 16-hex-character id for a raw URL. Identical across calls and processes.
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_ID_LEN);
    hex
}

/// Placeholder creator id tied to a content hash.
pub fn generic_creator_id(hash: &str) -> String {
    format!("{GENERIC_CREATOR_PREFIX}{}", &hash[..HASH_CREATOR_LEN.min(hash.len())])
}

/// Dispatch a host to a platform by substring match.
pub fn detect_platform(host: &str) -> Platform {
    let host = host.to_ascii_lowercase();
    if host.contains("youtube.com") || host.contains("youtu.be") {
        Platform::Youtube
    } else if host.contains("instagram.com") {
        Platform::Instagram
    } else if host.contains("tiktok.com") {
        Platform::Tiktok
    } else {
        Platform::Other
    }
}

/// What the URL alone tells us, before any remote lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub platform: Platform,
    pub canonical_id: Option<String>,
    /// Creator handle visible in the URL itself (Instagram/TikTok usernames).
    pub creator_handle: Option<String>,
}

/// Parse a URL into platform + platform-native ids. Never fails; unknown
/// shapes yield `canonical_id: None`.
pub fn parse_url(raw: &str) -> ParsedUrl {
    let Some(parsed) = parse_lenient(raw) else {
        return ParsedUrl {
            platform: Platform::Other,
            canonical_id: None,
            creator_handle: None,
        };
    };

    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let platform = detect_platform(&host);
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segs| segs.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let (canonical_id, creator_handle) = match platform {
        Platform::Youtube => (youtube_id(&host, &segments, &parsed), None),
        Platform::Instagram => instagram_ids(&segments),
        Platform::Tiktok => tiktok_ids(&segments),
        Platform::Other => (None, None),
    };

    ParsedUrl {
        platform,
        canonical_id,
        creator_handle,
    }
}

/// Accept bare "youtu.be/abc" style input by assuming https.
fn parse_lenient(raw: &str) -> Option<url::Url> {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(url) => Some(url),
        Err(_) if !trimmed.contains("://") => url::Url::parse(&format!("https://{trimmed}")).ok(),
        Err(_) => None,
    }
}

fn youtube_id(host: &str, segments: &[&str], parsed: &url::Url) -> Option<String> {
    let candidate = if host.contains("youtu.be") {
        segments.first().map(|s| s.to_string())
    } else {
        match segments {
            ["watch", ..] => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            ["shorts" | "live" | "embed" | "v", id, ..] => Some(id.to_string()),
            _ => None,
        }
    };
    candidate.filter(|id| is_token(id))
}

fn instagram_ids(segments: &[&str]) -> (Option<String>, Option<String>) {
    const MEDIA_KINDS: [&str; 4] = ["p", "reel", "reels", "tv"];

    if let Some(pos) = segments.iter().position(|s| MEDIA_KINDS.contains(s)) {
        if let Some(code) = segments.get(pos + 1).filter(|c| is_token(c)) {
            // "/<user>/reel/<code>" carries the username in front.
            let user = (pos == 1).then(|| handle_from(segments[0]));
            return (Some(code.to_string()), user);
        }
    }
    if let ["stories", user, id, ..] = segments {
        return (Some(id.to_string()), Some(handle_from(user)));
    }
    (joined_path(segments), None)
}

fn tiktok_ids(segments: &[&str]) -> (Option<String>, Option<String>) {
    let user = segments
        .first()
        .and_then(|s| s.strip_prefix('@'))
        .filter(|s| !s.is_empty())
        .map(handle_from);

    match segments {
        [_, "video" | "photo", id, ..] if is_token(id) => (Some(id.to_string()), user),
        _ => (joined_path(segments), user),
    }
}

fn joined_path(segments: &[&str]) -> Option<String> {
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("_"))
    }
}

fn handle_from(raw: &str) -> String {
    raw.trim_start_matches('@').to_ascii_lowercase()
}

fn is_token(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A resolved creator id split back into platform and native id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorRef {
    pub platform: Platform,
    /// Channel id for YouTube, username for Instagram/TikTok.
    pub native_id: String,
}

impl CreatorRef {
    pub fn creator_id(&self) -> String {
        let prefix = match self.platform {
            Platform::Youtube => YOUTUBE_CREATOR_PREFIX,
            Platform::Instagram => INSTAGRAM_CREATOR_PREFIX,
            Platform::Tiktok => TIKTOK_CREATOR_PREFIX,
            Platform::Other => GENERIC_CREATOR_PREFIX,
        };
        format!("{prefix}{}", self.native_id)
    }

    /// Recover the platform and native id from a creator id. Placeholder
    /// creator ids (hash-derived) return `None`.
    pub fn parse(creator_id: &str) -> Option<Self> {
        let (platform, native) = [
            (Platform::Youtube, YOUTUBE_CREATOR_PREFIX),
            (Platform::Instagram, INSTAGRAM_CREATOR_PREFIX),
            (Platform::Tiktok, TIKTOK_CREATOR_PREFIX),
        ]
        .into_iter()
        .find_map(|(platform, prefix)| {
            creator_id
                .strip_prefix(prefix)
                .map(|rest| (platform, rest))
        })?;

        if native.is_empty() {
            return None;
        }
        Some(Self {
            platform,
            native_id: native.to_string(),
        })
    }
}

pub struct IdentityResolver {
    directory: Option<Arc<dyn CreatorDirectory>>,
    lookup_timeout: Duration,
}

impl IdentityResolver {
    pub fn new(directory: Option<Arc<dyn CreatorDirectory>>, lookup_timeout: Duration) -> Self {
        Self {
            directory,
            lookup_timeout,
        }
    }

    /// Resolver with no channel registry: creators come from the URL or the hash.
    pub fn offline() -> Self {
        Self::new(None, Duration::from_secs(5))
    }

    /// Resolve a raw URL. Total: lookup failures degrade the creator id, never the call.
    pub async fn resolve(&self, url: &str) -> ContentIdentity {
        let parsed = parse_url(url);
        let hash = url_hash(url);
        let extracted = parsed.canonical_id.is_some();
        let canonical_id = parsed.canonical_id.unwrap_or_else(|| hash.clone());

        let creator = match parsed.platform {
            Platform::Youtube if extracted => self
                .youtube_channel(&canonical_id)
                .await
                .map(|channel| CreatorRef {
                    platform: Platform::Youtube,
                    native_id: channel,
                }),
            Platform::Instagram | Platform::Tiktok => {
                parsed.creator_handle.map(|handle| CreatorRef {
                    platform: parsed.platform,
                    native_id: handle,
                })
            }
            _ => None,
        };

        let creator_id = match creator {
            Some(c) => c.creator_id(),
            None if extracted => generic_creator_id(&url_hash(&format!(
                "{}:{canonical_id}",
                parsed.platform.as_str()
            ))),
            None => generic_creator_id(&hash),
        };

        debug!(
            url,
            platform = %parsed.platform,
            canonical_id = %canonical_id,
            creator_id = %creator_id,
            "Resolved content identity"
        );

        ContentIdentity {
            platform: parsed.platform,
            canonical_id,
            creator_id,
            normalized_url: url.to_string(),
        }
    }

    async fn youtube_channel(&self, video_id: &str) -> Option<String> {
        let directory = self.directory.as_ref()?;
        match tokio::time::timeout(self.lookup_timeout, directory.channel_for_content(video_id))
            .await
        {
            Ok(Ok(Some(channel))) if !channel.is_empty() => Some(channel),
            Ok(Ok(_)) => {
                debug!(video_id, "No channel found for video");
                None
            }
            Ok(Err(e)) => {
                warn!(video_id, error = %e, "Channel lookup failed, using placeholder creator");
                None
            }
            Err(_) => {
                warn!(video_id, "Channel lookup timed out, using placeholder creator");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_of(url: &str) -> Option<String> {
        parse_url(url).canonical_id
    }

    #[test]
    fn hash_is_sixteen_hex_and_stable() {
        let a = url_hash("https://example.com/clip.mp4");
        let b = url_hash("https://example.com/clip.mp4");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, url_hash("https://example.com/other.mp4"));
    }

    #[test]
    fn youtube_variants_share_an_id() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(id_of("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
        assert_eq!(id_of("https://youtube.com/watch?t=42&v=dQw4w9WgXcQ"), expected);
        assert_eq!(id_of("https://youtu.be/dQw4w9WgXcQ?si=abc123"), expected);
        assert_eq!(id_of("https://m.youtube.com/shorts/dQw4w9WgXcQ/"), expected);
        assert_eq!(id_of("https://www.youtube.com/live/dQw4w9WgXcQ"), expected);
        assert_eq!(id_of("https://www.youtube.com/embed/dQw4w9WgXcQ"), expected);
        assert_eq!(id_of("youtu.be/dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn youtube_without_video_id() {
        let parsed = parse_url("https://www.youtube.com/@somechannel");
        assert_eq!(parsed.platform, Platform::Youtube);
        assert_eq!(parsed.canonical_id, None);
    }

    #[test]
    fn instagram_reel_with_username() {
        let parsed = parse_url("https://www.instagram.com/SomeUser/reel/C3xYz_AbC/?igsh=1");
        assert_eq!(parsed.platform, Platform::Instagram);
        assert_eq!(parsed.canonical_id.as_deref(), Some("C3xYz_AbC"));
        assert_eq!(parsed.creator_handle.as_deref(), Some("someuser"));
    }

    #[test]
    fn instagram_post_without_username() {
        let parsed = parse_url("https://instagram.com/p/B1a2c3/");
        assert_eq!(parsed.canonical_id.as_deref(), Some("B1a2c3"));
        assert_eq!(parsed.creator_handle, None);
    }

    #[test]
    fn tiktok_video() {
        let parsed =
            parse_url("https://www.tiktok.com/@Creator.Name/video/7301234567890123456?lang=en");
        assert_eq!(parsed.platform, Platform::Tiktok);
        assert_eq!(parsed.canonical_id.as_deref(), Some("7301234567890123456"));
        assert_eq!(parsed.creator_handle.as_deref(), Some("creator.name"));
    }

    #[test]
    fn tiktok_short_link_uses_path() {
        let parsed = parse_url("https://vm.tiktok.com/ZMabc123/");
        assert_eq!(parsed.canonical_id.as_deref(), Some("ZMabc123"));
        assert_eq!(parsed.creator_handle, None);
    }

    #[test]
    fn unknown_host_is_other() {
        let parsed = parse_url("https://cdn.example.com/media/image.png");
        assert_eq!(parsed.platform, Platform::Other);
        assert_eq!(parsed.canonical_id, None);
    }

    #[test]
    fn garbage_input_is_other() {
        assert_eq!(parse_url("not a url at all").platform, Platform::Other);
    }

    #[test]
    fn creator_ref_round_trips() {
        let r = CreatorRef {
            platform: Platform::Youtube,
            native_id: "UCabc".into(),
        };
        assert_eq!(r.creator_id(), "youtube_creator_UCabc");
        assert_eq!(CreatorRef::parse(&r.creator_id()), Some(r));
        assert_eq!(CreatorRef::parse("creator_1a2b3c4d"), None);
        assert_eq!(CreatorRef::parse("tiktok_creator_"), None);
    }

    #[tokio::test]
    async fn offline_resolution_falls_back_to_hash() {
        let resolver = IdentityResolver::offline();
        let url = "https://example.com/some/video";
        let identity = resolver.resolve(url).await;
        let hash = url_hash(url);
        assert_eq!(identity.platform, Platform::Other);
        assert_eq!(identity.canonical_id, hash);
        assert_eq!(identity.creator_id, format!("creator_{}", &hash[..8]));
        assert_eq!(identity.normalized_url, url);
        assert_eq!(identity.content_id(), format!("other:{hash}"));
    }

    #[tokio::test]
    async fn offline_youtube_gets_placeholder_creator() {
        let identity = IdentityResolver::offline()
            .resolve("https://youtu.be/dQw4w9WgXcQ")
            .await;
        assert_eq!(identity.canonical_id, "dQw4w9WgXcQ");
        assert!(identity.creator_id.starts_with("creator_"));
    }

    #[tokio::test]
    async fn url_spellings_of_one_video_share_placeholder_creator() {
        let resolver = IdentityResolver::offline();
        let short = resolver.resolve("https://youtu.be/dQw4w9WgXcQ").await;
        let watch = resolver
            .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await;
        let shorts = resolver
            .resolve("https://m.youtube.com/shorts/dQw4w9WgXcQ?feature=share")
            .await;

        assert_eq!(short.content_id(), watch.content_id());
        assert_eq!(short.creator_id, watch.creator_id);
        assert_eq!(short.creator_id, shorts.creator_id);
        assert_eq!(
            short.creator_id,
            generic_creator_id(&url_hash("youtube:dQw4w9WgXcQ"))
        );
    }

    #[tokio::test]
    async fn tiktok_creator_from_url() {
        let identity = IdentityResolver::offline()
            .resolve("https://www.tiktok.com/@someone/video/123")
            .await;
        assert_eq!(identity.creator_id, "tiktok_creator_someone");
        assert_eq!(identity.content_id(), "tiktok:123");
    }
}
