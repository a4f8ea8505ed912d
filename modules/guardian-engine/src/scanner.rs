// Scan orchestration: identity → overrides → collectors → fusion → history.
//
// `scan` has no failure path. Collectors degrade to neutral signals, and
// storage errors on the scan path are logged and skipped. The caller-facing
// operations around it (vote, lists, history) do return errors.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use guardian_common::{
    validate_fingerprint, Config, ContentIdentity, EvidenceItem, EvidenceSource, GuardianError,
    ListEntry, ListType, ScanResult, Strength, Verdict, VoteChoice, VoteOutcome,
};
use inference_client::InferenceClient;
use youtube_client::YoutubeClient;

use crate::collectors::{aggregate_votes, CommunityCollector, ModelCollector, PlatformCollector};
use crate::fusion::{FusionEngine, ScoringPolicy};
use crate::identity::IdentityResolver;
use crate::reputation::HttpReputationLists;
use crate::traits::{CreatorDirectory, DisclosureProvider, ReputationSource, ScanStore};

const TRUSTED_PREFIX: &str = "trusted_";
const TRUSTED_WEIGHT: f64 = 1.5;
const DEFAULT_WEIGHT: f64 = 1.0;

/// Vote weight for a fingerprint. Trusted fingerprints count for more.
pub fn vote_weight(user_fingerprint: &str) -> f64 {
    if user_fingerprint.starts_with(TRUSTED_PREFIX) {
        TRUSTED_WEIGHT
    } else {
        DEFAULT_WEIGHT
    }
}

pub struct Scanner {
    resolver: IdentityResolver,
    platform: PlatformCollector,
    community: CommunityCollector,
    model: ModelCollector,
    engine: FusionEngine,
    store: Arc<dyn ScanStore>,
}

impl Scanner {
    pub fn new(
        resolver: IdentityResolver,
        platform: PlatformCollector,
        community: CommunityCollector,
        model: ModelCollector,
        engine: FusionEngine,
        store: Arc<dyn ScanStore>,
    ) -> Self {
        Self {
            resolver,
            platform,
            community,
            model,
            engine,
            store,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &Config, store: Arc<dyn ScanStore>) -> Result<Self, GuardianError> {
        let policy = match &config.scoring_policy_path {
            Some(path) => ScoringPolicy::from_json_file(path)?,
            None => ScoringPolicy::v1(),
        };
        info!(version = %policy.version, "Scoring policy loaded");

        let youtube = match config.youtube_api_key.as_deref() {
            Some(key) => Some(Arc::new(
                YoutubeClient::new(key, config.platform_timeout)
                    .map_err(|e| GuardianError::Config(format!("YouTube client: {e}")))?,
            )),
            None => {
                warn!("YOUTUBE_API_KEY not set, platform and channel lookups disabled");
                None
            }
        };
        let directory = youtube.clone().map(|c| c as Arc<dyn CreatorDirectory>);
        let disclosure = youtube.map(|c| c as Arc<dyn DisclosureProvider>);

        let inference = InferenceClient::new(&config.model_service_url, config.model_timeout)
            .map_err(|e| GuardianError::Config(format!("Inference client: {e}")))?;

        let reputation: Option<Arc<dyn ReputationSource>> =
            if config.block_list_url.is_some() || config.warn_list_url.is_some() {
                Some(Arc::new(HttpReputationLists::new(
                    config.block_list_url.clone(),
                    config.warn_list_url.clone(),
                    config.reputation_timeout,
                )?))
            } else {
                None
            };

        let resolver = IdentityResolver::new(directory.clone(), config.platform_timeout);
        let platform = PlatformCollector::new(disclosure, config.platform_timeout);
        let community = CommunityCollector::new(
            store.clone(),
            reputation,
            directory,
            policy.reputation,
            config.reputation_timeout,
        );
        let model = ModelCollector::new(Arc::new(inference), config.model_timeout);
        let engine = FusionEngine::new(policy)?;

        Ok(Self::new(resolver, platform, community, model, engine, store))
    }

    /// Produce a verdict for a URL on behalf of a user. Always returns a result.
    pub async fn scan(&self, url: &str, user_fingerprint: &str, conservative: bool) -> ScanResult {
        let identity = self.resolver.resolve(url).await;
        let content_id = identity.content_id();

        let list_override = match self
            .store
            .list_override(user_fingerprint, &identity.creator_id)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    content_id = %content_id,
                    error = %e,
                    "List override lookup failed, ignoring"
                );
                None
            }
        };

        let result = match list_override {
            Some(list_type) => override_result(&identity, content_id, list_type),
            None => self.fused_result(&identity, content_id, conservative).await,
        };

        if let Err(e) = self
            .store
            .append_history(&result.content_id, user_fingerprint, &result)
            .await
        {
            warn!(content_id = %result.content_id, error = %e, "History append failed");
        }

        info!(
            content_id = %result.content_id,
            creator_id = %result.creator_id,
            verdict = %result.verdict,
            final_score = result.final_score,
            conservative,
            list_override = list_override.map(|l| l.as_str()),
            "Scan complete"
        );
        result
    }

    async fn fused_result(
        &self,
        identity: &ContentIdentity,
        content_id: String,
        conservative: bool,
    ) -> ScanResult {
        let (platform, community, model) = tokio::join!(
            self.platform.collect(identity),
            self.community.collect(&content_id, &identity.creator_id),
            self.model.collect(identity),
        );

        let fused = self
            .engine
            .fuse_signals(&platform, &community, &model, conservative);
        if fused.reputation_override {
            info!(
                content_id = %content_id,
                "Block-listed creator lifted score to likely-AI threshold"
            );
        }

        let evidence = vec![
            EvidenceItem::from_signal(EvidenceSource::Platform, &platform),
            EvidenceItem::from_signal(EvidenceSource::Community, &community.signal),
            EvidenceItem::from_signal(EvidenceSource::Model, &model),
            settings_evidence(conservative),
        ];

        ScanResult {
            content_id,
            platform: identity.platform,
            canonical_id: identity.canonical_id.clone(),
            creator_id: identity.creator_id.clone(),
            verdict: fused.verdict,
            final_score: fused.final_score,
            confidence_band: fused.confidence_band,
            platform_score: platform.score,
            community_score: community.signal.score,
            model_score: model.score,
            evidence,
            scanned_at: Utc::now(),
        }
    }

    /// Record (or replace) a user's vote and return the vote-only community score.
    pub async fn vote(
        &self,
        content_id: &str,
        user_fingerprint: &str,
        choice: VoteChoice,
    ) -> Result<VoteOutcome, GuardianError> {
        validate_fingerprint(user_fingerprint)?;
        let weight = vote_weight(user_fingerprint);
        self.store
            .upsert_vote(content_id, user_fingerprint, choice, weight)
            .await?;

        let votes = self.store.votes_for_content(content_id).await?;
        let community = aggregate_votes(&votes);
        info!(content_id, vote = ?choice, weight, score = community.signal.score, "Vote recorded");

        Ok(VoteOutcome {
            ok: true,
            updated_community_score: community.signal.score,
        })
    }

    pub async fn set_list_entry(
        &self,
        user_fingerprint: &str,
        creator_id: &str,
        list_type: ListType,
    ) -> Result<(), GuardianError> {
        validate_fingerprint(user_fingerprint)?;
        if creator_id.trim().is_empty() {
            return Err(GuardianError::Validation("creator id must not be empty".into()));
        }
        self.store
            .upsert_list_entry(ListEntry {
                user_fingerprint: user_fingerprint.to_string(),
                creator_id: creator_id.trim().to_string(),
                list_type,
            })
            .await?;
        Ok(())
    }

    /// A user's list entries sorted by creator id, optionally filtered by type.
    pub async fn list_entries(
        &self,
        user_fingerprint: &str,
        filter: Option<ListType>,
    ) -> Result<Vec<ListEntry>, GuardianError> {
        validate_fingerprint(user_fingerprint)?;
        let mut entries = self.store.list_entries(user_fingerprint).await?;
        if let Some(list_type) = filter {
            entries.retain(|e| e.list_type == list_type);
        }
        Ok(entries)
    }

    pub async fn remove_list_entry(
        &self,
        user_fingerprint: &str,
        creator_id: &str,
    ) -> Result<(), GuardianError> {
        validate_fingerprint(user_fingerprint)?;
        self.store
            .remove_list_entry(user_fingerprint, creator_id.trim())
            .await?;
        Ok(())
    }

    /// Most-recent-first scan history.
    pub async fn history(&self, user_fingerprint: &str) -> Result<Vec<ScanResult>, GuardianError> {
        validate_fingerprint(user_fingerprint)?;
        Ok(self.store.history(user_fingerprint).await?)
    }
}

fn override_result(
    identity: &ContentIdentity,
    content_id: String,
    list_type: ListType,
) -> ScanResult {
    let (verdict, score, message) = match list_type {
        ListType::Allow => (
            Verdict::LikelyHuman,
            0.0,
            "Creator is on your allow list, so content is allowed.",
        ),
        ListType::Block => (
            Verdict::LikelyAi,
            1.0,
            "Creator is on your block list, so content is blocked.",
        ),
    };

    ScanResult {
        content_id,
        platform: identity.platform,
        canonical_id: identity.canonical_id.clone(),
        creator_id: identity.creator_id.clone(),
        verdict,
        final_score: score,
        confidence_band: Strength::High,
        platform_score: score,
        community_score: score,
        model_score: score,
        evidence: vec![EvidenceItem {
            source: EvidenceSource::UserList,
            message: message.to_string(),
            strength: Strength::High,
        }],
        scanned_at: Utc::now(),
    }
}

fn settings_evidence(conservative: bool) -> EvidenceItem {
    let message = if conservative {
        "Conservative mode is ON (stricter AI threshold)."
    } else {
        "Conservative mode is OFF (faster to label AI)."
    };
    EvidenceItem {
        source: EvidenceSource::Settings,
        message: message.to_string(),
        strength: Strength::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScannerBuilder;

    #[test]
    fn trusted_fingerprints_weigh_more() {
        assert_eq!(vote_weight("trusted_abc"), 1.5);
        assert_eq!(vote_weight("abc"), 1.0);
        assert_eq!(vote_weight("untrusted_abc"), 1.0);
    }

    #[test]
    fn settings_evidence_states_mode() {
        let on = settings_evidence(true);
        assert_eq!(on.source, EvidenceSource::Settings);
        assert_eq!(on.strength, Strength::Medium);
        assert!(on.message.contains("ON"));
        assert!(settings_evidence(false).message.contains("OFF"));
    }

    #[tokio::test]
    async fn vote_returns_updated_score() {
        let scanner = ScannerBuilder::new().build();
        let first = scanner.vote("other:abc", "user1", VoteChoice::Ai).await.unwrap();
        assert!(first.ok);
        assert_eq!(first.updated_community_score, 1.0);

        let second = scanner.vote("other:abc", "user2", VoteChoice::NotAi).await.unwrap();
        assert_eq!(second.updated_community_score, 0.5);
    }

    #[tokio::test]
    async fn short_fingerprint_rejected() {
        let scanner = ScannerBuilder::new().build();
        let err = scanner.vote("other:abc", "ab", VoteChoice::Ai).await.unwrap_err();
        assert!(matches!(err, GuardianError::Validation(_)));
        assert!(scanner.history("ab").await.is_err());
    }

    #[tokio::test]
    async fn list_filter_and_removal() {
        let scanner = ScannerBuilder::new().build();
        scanner.set_list_entry("user1", "tiktok_creator_b", ListType::Block).await.unwrap();
        scanner.set_list_entry("user1", "tiktok_creator_a", ListType::Allow).await.unwrap();

        let all = scanner.list_entries("user1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].creator_id, "tiktok_creator_a");

        let blocked = scanner.list_entries("user1", Some(ListType::Block)).await.unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].creator_id, "tiktok_creator_b");

        scanner.remove_list_entry("user1", "tiktok_creator_b").await.unwrap();
        scanner.remove_list_entry("user1", "tiktok_creator_b").await.unwrap();
        assert_eq!(scanner.list_entries("user1", None).await.unwrap().len(), 1);
    }
}
