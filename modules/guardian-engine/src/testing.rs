// Test mocks for the scan pipeline.
//
// One mock per collaborator trait:
// - MockDisclosure (DisclosureProvider): video id → tri-state flag
// - MockDirectory (CreatorDirectory): video → channel, channel → handle
// - MockReputation (ReputationSource): fixed block/warn lists
// - MockInference (ModelInference): fixed response or failure
// - FailingStore (ScanStore): every operation errors
//
// Every mock counts its calls and has a `hanging()` mode that never resolves,
// for exercising timeouts. Working storage needs no mock: MemoryStore is
// in-process.
//
// Plus helpers for building identities, votes, scan results and scanners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use guardian_common::{
    ConfidenceBand, ContentIdentity, ListEntry, ListType, Platform, ReputationList, ScanResult,
    Verdict, Vote, VoteChoice,
};
use inference_client::{InferenceResponse, MediaKind};

use crate::collectors::{CommunityCollector, ModelCollector, PlatformCollector};
use crate::fusion::{FusionEngine, ScoringPolicy};
use crate::identity::{generic_creator_id, parse_url, url_hash, IdentityResolver};
use crate::scanner::Scanner;
use crate::store::MemoryStore;
use crate::traits::{
    CreatorDirectory, DisclosureProvider, ModelInference, ReputationSource, ScanStore,
};

/// Timeout used by `ScannerBuilder` for every collaborator.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(100);

async fn hang() {
    std::future::pending::<()>().await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Identity with a placeholder creator, for collectors that only look at
/// platform and canonical id.
pub fn identity(platform: Platform, canonical_id: &str) -> ContentIdentity {
    ContentIdentity {
        platform,
        canonical_id: canonical_id.to_string(),
        creator_id: generic_creator_id(&url_hash(canonical_id)),
        normalized_url: format!("https://{}.test/{canonical_id}", platform.as_str()),
    }
}

/// Identity resolved from the URL alone (no channel or handle lookup).
pub fn identity_for_url(url: &str) -> ContentIdentity {
    let parsed = parse_url(url);
    let canonical_id = parsed.canonical_id.unwrap_or_else(|| url_hash(url));
    let content_id = format!("{}:{canonical_id}", parsed.platform);
    ContentIdentity {
        platform: parsed.platform,
        canonical_id,
        creator_id: generic_creator_id(&url_hash(&content_id)),
        normalized_url: url.to_string(),
    }
}

pub fn vote(content_id: &str, user: &str, choice: VoteChoice, weight: f64) -> Vote {
    Vote {
        content_id: content_id.to_string(),
        user_fingerprint: user.to_string(),
        vote: choice,
        weight,
        created_at: Utc::now(),
    }
}

/// A neutral "unclear" result with a fixed timestamp.
pub fn scan_result(content_id: &str) -> ScanResult {
    let (platform, canonical_id) = content_id
        .split_once(':')
        .unwrap_or(("other", content_id));
    let platform = match platform {
        "youtube" => Platform::Youtube,
        "instagram" => Platform::Instagram,
        "tiktok" => Platform::Tiktok,
        _ => Platform::Other,
    };
    ScanResult {
        content_id: content_id.to_string(),
        platform,
        canonical_id: canonical_id.to_string(),
        creator_id: generic_creator_id(&url_hash(content_id)),
        verdict: Verdict::Unclear,
        final_score: 0.5,
        confidence_band: ConfidenceBand::Medium,
        platform_score: 0.5,
        community_score: 0.5,
        model_score: 0.5,
        evidence: Vec::new(),
        scanned_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// MockDisclosure
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered video ids.
#[derive(Default)]
pub struct MockDisclosure {
    flags: HashMap<String, Option<bool>>,
    hanging: bool,
    calls: AtomicUsize,
}

impl MockDisclosure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_video(mut self, video_id: &str, flag: Option<bool>) -> Self {
        self.flags.insert(video_id.to_string(), flag);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DisclosureProvider for MockDisclosure {
    async fn synthetic_disclosure(&self, canonical_id: &str) -> Result<Option<bool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging {
            hang().await;
        }
        match self.flags.get(canonical_id) {
            Some(flag) => Ok(*flag),
            None => bail!("MockDisclosure: no video registered for {canonical_id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDirectory
// ---------------------------------------------------------------------------

/// Unregistered ids resolve to `Ok(None)`; `failing()` turns every call into `Err`.
#[derive(Default)]
pub struct MockDirectory {
    channels: HashMap<String, String>,
    handles: HashMap<String, String>,
    failing: bool,
    hanging: bool,
    calls: AtomicUsize,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, video_id: &str, channel_id: &str) -> Self {
        self.channels.insert(video_id.to_string(), channel_id.to_string());
        self
    }

    pub fn with_handle(mut self, channel_id: &str, handle: &str) -> Self {
        self.handles.insert(channel_id.to_string(), handle.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging {
            hang().await;
        }
        if self.failing {
            bail!("MockDirectory: lookup failed");
        }
        Ok(())
    }
}

#[async_trait]
impl CreatorDirectory for MockDirectory {
    async fn channel_for_content(&self, canonical_id: &str) -> Result<Option<String>> {
        self.enter().await?;
        Ok(self.channels.get(canonical_id).cloned())
    }

    async fn handle_for_channel(&self, channel_id: &str) -> Result<Option<String>> {
        self.enter().await?;
        Ok(self.handles.get(channel_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MockReputation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockReputation {
    block: Vec<String>,
    warn: Vec<String>,
    failing: bool,
    hanging: bool,
    calls: AtomicUsize,
}

impl MockReputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, handles: &[&str]) -> Self {
        self.block.extend(handles.iter().map(|h| h.to_string()));
        self
    }

    pub fn warn(mut self, handles: &[&str]) -> Self {
        self.warn.extend(handles.iter().map(|h| h.to_string()));
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReputationSource for MockReputation {
    async fn fetch_list(&self, list: ReputationList) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging {
            hang().await;
        }
        if self.failing {
            bail!("MockReputation: {} list unavailable", list.as_str());
        }
        Ok(match list {
            ReputationList::Block => self.block.clone(),
            ReputationList::Warn => self.warn.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockInference
// ---------------------------------------------------------------------------

/// Fails every call until `responding()` sets a response.
#[derive(Default)]
pub struct MockInference {
    response: Option<InferenceResponse>,
    hanging: bool,
    calls: AtomicUsize,
    last_kind: Mutex<Option<MediaKind>>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responding(mut self, score: f64, band: &str) -> Self {
        self.response = Some(InferenceResponse {
            score,
            confidence_band: band.to_string(),
            reason: None,
        });
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_kind(&self) -> Option<MediaKind> {
        *self.last_kind.lock().unwrap()
    }
}

#[async_trait]
impl ModelInference for MockInference {
    async fn infer(&self, media_url: &str, kind: MediaKind) -> Result<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_kind.lock().unwrap() = Some(kind);
        if self.hanging {
            hang().await;
        }
        match &self.response {
            Some(resp) => Ok(resp.clone()),
            None => bail!("MockInference: service unavailable for {media_url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// FailingStore
// ---------------------------------------------------------------------------

/// Storage backend that is down: every call errors.
#[derive(Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, op: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        bail!("FailingStore: {op} unavailable")
    }
}

#[async_trait]
impl ScanStore for FailingStore {
    async fn list_override(&self, _user: &str, _creator_id: &str) -> Result<Option<ListType>> {
        self.fail("list_override")
    }

    async fn upsert_list_entry(&self, _entry: ListEntry) -> Result<()> {
        self.fail("upsert_list_entry")
    }

    async fn list_entries(&self, _user: &str) -> Result<Vec<ListEntry>> {
        self.fail("list_entries")
    }

    async fn remove_list_entry(&self, _user: &str, _creator_id: &str) -> Result<()> {
        self.fail("remove_list_entry")
    }

    async fn upsert_vote(
        &self,
        _content_id: &str,
        _user: &str,
        _vote: VoteChoice,
        _weight: f64,
    ) -> Result<()> {
        self.fail("upsert_vote")
    }

    async fn votes_for_content(&self, _content_id: &str) -> Result<Vec<Vote>> {
        self.fail("votes_for_content")
    }

    async fn append_history(
        &self,
        _content_id: &str,
        _user: &str,
        _result: &ScanResult,
    ) -> Result<()> {
        self.fail("append_history")
    }

    async fn history(&self, _user: &str) -> Result<Vec<ScanResult>> {
        self.fail("history")
    }
}

// ---------------------------------------------------------------------------
// ScannerBuilder
// ---------------------------------------------------------------------------

/// Wires a `Scanner` from mocks. Anything not supplied is absent (no
/// credential, no lists) or failing (inference), so every collector falls back.
pub struct ScannerBuilder {
    store: Arc<dyn ScanStore>,
    disclosure: Option<Arc<MockDisclosure>>,
    directory: Option<Arc<MockDirectory>>,
    reputation: Option<Arc<MockReputation>>,
    inference: Arc<MockInference>,
    policy: ScoringPolicy,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            disclosure: None,
            directory: None,
            reputation: None,
            inference: Arc::new(MockInference::new()),
            policy: ScoringPolicy::v1(),
        }
    }
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn ScanStore>) -> Self {
        self.store = store;
        self
    }

    pub fn disclosure(mut self, mock: Arc<MockDisclosure>) -> Self {
        self.disclosure = Some(mock);
        self
    }

    pub fn directory(mut self, mock: Arc<MockDirectory>) -> Self {
        self.directory = Some(mock);
        self
    }

    pub fn reputation(mut self, mock: Arc<MockReputation>) -> Self {
        self.reputation = Some(mock);
        self
    }

    pub fn inference(mut self, mock: Arc<MockInference>) -> Self {
        self.inference = mock;
        self
    }

    pub fn policy(mut self, policy: ScoringPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Scanner {
        let directory = self
            .directory
            .map(|d| d as Arc<dyn CreatorDirectory>);
        let resolver = IdentityResolver::new(directory.clone(), TEST_TIMEOUT);
        let platform = PlatformCollector::new(
            self.disclosure.map(|d| d as Arc<dyn DisclosureProvider>),
            TEST_TIMEOUT,
        );
        let community = CommunityCollector::new(
            self.store.clone(),
            self.reputation.map(|r| r as Arc<dyn ReputationSource>),
            directory,
            self.policy.reputation,
            TEST_TIMEOUT,
        );
        let model = ModelCollector::new(self.inference, TEST_TIMEOUT);
        let engine = FusionEngine::new(self.policy).expect("test policy is valid");
        Scanner::new(resolver, platform, community, model, engine, self.store)
    }
}
