use serde::Deserialize;

/// Wrapper for YouTube Data API list responses (`videos.list`, `channels.list`).
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// A `videos.list` item requested with `part=status`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusItem {
    pub id: String,
    #[serde(default)]
    pub status: Option<VideoStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatus {
    /// Creator-declared altered or synthetic content. Absent when the creator
    /// never answered the disclosure question.
    #[serde(rename = "containsSyntheticMedia")]
    pub contains_synthetic_media: Option<bool>,
    #[serde(rename = "privacyStatus")]
    pub privacy_status: Option<String>,
}

/// A `videos.list` item requested with `part=snippet`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoSnippetItem {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSnippet {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    pub title: Option<String>,
}

/// A `channels.list` item requested with `part=snippet`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSnippet {
    pub title: Option<String>,
    /// The channel's `@handle`, e.g. "@somecreator".
    #[serde(rename = "customUrl")]
    pub custom_url: Option<String>,
}

/// Tri-state synthetic-media disclosure as published by YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticDisclosure {
    Declared,
    Denied,
    Unknown,
}

impl SyntheticDisclosure {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => SyntheticDisclosure::Declared,
            Some(false) => SyntheticDisclosure::Denied,
            None => SyntheticDisclosure::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_with_disclosure_flag() {
        let body = r#"{"items":[{"id":"abc","status":{"privacyStatus":"public","containsSyntheticMedia":true}}]}"#;
        let resp: ListResponse<VideoStatusItem> = serde_json::from_str(body).unwrap();
        let flag = resp.items[0]
            .status
            .as_ref()
            .and_then(|s| s.contains_synthetic_media);
        assert_eq!(SyntheticDisclosure::from_flag(flag), SyntheticDisclosure::Declared);
    }

    #[test]
    fn status_without_disclosure_flag_is_unknown() {
        let body = r#"{"items":[{"id":"abc","status":{"privacyStatus":"public"}}]}"#;
        let resp: ListResponse<VideoStatusItem> = serde_json::from_str(body).unwrap();
        let flag = resp.items[0]
            .status
            .as_ref()
            .and_then(|s| s.contains_synthetic_media);
        assert_eq!(SyntheticDisclosure::from_flag(flag), SyntheticDisclosure::Unknown);
    }

    #[test]
    fn missing_items_defaults_to_empty() {
        let resp: ListResponse<ChannelItem> = serde_json::from_str(r#"{"kind":"x"}"#).unwrap();
        assert!(resp.items.is_empty());
    }

    #[test]
    fn channel_custom_url() {
        let body = r#"{"items":[{"id":"UC1","snippet":{"title":"Some Creator","customUrl":"@somecreator"}}]}"#;
        let resp: ListResponse<ChannelItem> = serde_json::from_str(body).unwrap();
        let handle = resp.items[0].snippet.as_ref().and_then(|s| s.custom_url.clone());
        assert_eq!(handle.as_deref(), Some("@somecreator"));
    }
}
