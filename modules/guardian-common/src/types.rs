use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Identity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Other => "other",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical identity of one piece of content, derived from a raw URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdentity {
    pub platform: Platform,
    pub canonical_id: String,
    pub creator_id: String,
    /// The URL exactly as submitted.
    pub normalized_url: String,
}

impl ContentIdentity {
    /// Stable join key for votes, history and every collector: `platform:canonical_id`.
    pub fn content_id(&self) -> String {
        format!("{}:{}", self.platform, self.canonical_id)
    }
}

// --- Signals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    High,
    Medium,
    Low,
}

/// The verdict confidence band shares the strength scale.
pub type ConfidenceBand = Strength;

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::High => "high",
            Strength::Medium => "medium",
            Strength::Low => "low",
        }
    }

    /// Parse a band reported by an external service. Anything unrecognised is `Low`.
    pub fn from_band(band: &str) -> Self {
        match band.trim().to_ascii_lowercase().as_str() {
            "high" => Strength::High,
            "medium" => Strength::Medium,
            _ => Strength::Low,
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What every collector returns. `score` is the estimate that the content is
/// AI-generated (1.0 = certain AI); `strength` is the collector's own confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub score: f64,
    pub message: String,
    pub strength: Strength,
}

impl Signal {
    pub const NEUTRAL_SCORE: f64 = 0.5;

    pub fn new(score: f64, message: impl Into<String>, strength: Strength) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            message: message.into(),
            strength,
        }
    }

    /// 0.5 / low: "no usable signal".
    pub fn neutral(message: impl Into<String>) -> Self {
        Self::new(Self::NEUTRAL_SCORE, message, Strength::Low)
    }
}

/// External reputation list a creator was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationList {
    Block,
    Warn,
}

impl ReputationList {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationList::Block => "block",
            ReputationList::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySignal {
    #[serde(flatten)]
    pub signal: Signal,
    /// Whether any vote existed, regardless of list membership.
    pub has_votes: bool,
    pub ai_weight: f64,
    pub not_ai_weight: f64,
    pub unsure_weight: f64,
    pub reputation: Option<ReputationList>,
}

// --- Evidence & verdict ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Platform,
    Community,
    Model,
    UserList,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: EvidenceSource,
    pub message: String,
    pub strength: Strength,
}

impl EvidenceItem {
    pub fn from_signal(source: EvidenceSource, signal: &Signal) -> Self {
        Self {
            source,
            message: signal.message.clone(),
            strength: signal.strength,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyAi,
    Unclear,
    LikelyHuman,
}

impl Verdict {
    /// Ordering toward `LikelyAi`: likely_human < unclear < likely_ai.
    pub fn severity(&self) -> u8 {
        match self {
            Verdict::LikelyHuman => 0,
            Verdict::Unclear => 1,
            Verdict::LikelyAi => 2,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::LikelyAi => write!(f, "likely_ai"),
            Verdict::Unclear => write!(f, "unclear"),
            Verdict::LikelyHuman => write!(f, "likely_human"),
        }
    }
}

/// The fused verdict for one scan. Persisted verbatim into history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub content_id: String,
    pub platform: Platform,
    pub canonical_id: String,
    pub creator_id: String,
    pub verdict: Verdict,
    pub final_score: f64,
    pub confidence_band: ConfidenceBand,
    pub platform_score: f64,
    pub community_score: f64,
    pub model_score: f64,
    pub evidence: Vec<EvidenceItem>,
    pub scanned_at: DateTime<Utc>,
}

// --- Votes & lists ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Ai,
    NotAi,
    Unsure,
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" => Ok(VoteChoice::Ai),
            "not_ai" | "not-ai" => Ok(VoteChoice::NotAi),
            "unsure" => Ok(VoteChoice::Unsure),
            other => Err(format!("unknown vote '{other}' (expected ai, not_ai or unsure)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub content_id: String,
    pub user_fingerprint: String,
    pub vote: VoteChoice,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Allow,
    Block,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Allow => "allow",
            ListType::Block => "block",
        }
    }
}

impl FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(ListType::Allow),
            "block" => Ok(ListType::Block),
            other => Err(format!("unknown list type '{other}' (expected allow or block)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub user_fingerprint: String,
    pub creator_id: String,
    pub list_type: ListType,
}

/// Response to a vote: the community score recomputed after the upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub ok: bool,
    pub updated_community_score: f64,
}
