use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use guardian_common::{
    CommunitySignal, Platform, ReputationList, Signal, Strength, Vote, VoteChoice,
};

use crate::fusion::ReputationPolicy;
use crate::identity::CreatorRef;
use crate::reputation::{contains_handle, normalize_handle};
use crate::traits::{CreatorDirectory, ReputationSource, ScanStore};

pub const HIGH_TIER_WEIGHT: f64 = 10.0;
pub const MEDIUM_TIER_WEIGHT: f64 = 4.0;

/// Weighted vote tally → community signal. No I/O.
///
/// `score = (ai + 0.5 * unsure) / total`; strength by total weight
/// (`>= 10` high, `>= 4` medium, else low).
pub fn aggregate_votes(votes: &[Vote]) -> CommunitySignal {
    if votes.is_empty() {
        return CommunitySignal {
            signal: Signal::neutral("No community votes yet."),
            has_votes: false,
            ai_weight: 0.0,
            not_ai_weight: 0.0,
            unsure_weight: 0.0,
            reputation: None,
        };
    }

    let (mut ai, mut not_ai, mut unsure) = (0.0, 0.0, 0.0);
    for v in votes {
        let w = if v.weight.is_finite() { v.weight.max(0.0) } else { 0.0 };
        match v.vote {
            VoteChoice::Ai => ai += w,
            VoteChoice::NotAi => not_ai += w,
            VoteChoice::Unsure => unsure += w,
        }
    }
    let total = ai + not_ai + unsure;

    let signal = if total <= 0.0 {
        Signal::neutral("Community votes exist, but no weighted signal available yet.")
    } else {
        let strength = if total >= HIGH_TIER_WEIGHT {
            Strength::High
        } else if total >= MEDIUM_TIER_WEIGHT {
            Strength::Medium
        } else {
            Strength::Low
        };
        Signal::new(
            (ai + 0.5 * unsure) / total,
            format!(
                "Community weighted votes -> ai: {ai:.1}, not_ai: {not_ai:.1}, unsure: {unsure:.1}"
            ),
            strength,
        )
    };

    CommunitySignal {
        signal,
        has_votes: true,
        ai_weight: ai,
        not_ai_weight: not_ai,
        unsure_weight: unsure,
        reputation: None,
    }
}

/// Votes from the store merged with external block/warn list membership.
pub struct CommunityCollector {
    store: Arc<dyn ScanStore>,
    reputation: Option<Arc<dyn ReputationSource>>,
    directory: Option<Arc<dyn CreatorDirectory>>,
    policy: ReputationPolicy,
    timeout: Duration,
}

impl CommunityCollector {
    pub fn new(
        store: Arc<dyn ScanStore>,
        reputation: Option<Arc<dyn ReputationSource>>,
        directory: Option<Arc<dyn CreatorDirectory>>,
        policy: ReputationPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            reputation,
            directory,
            policy,
            timeout,
        }
    }

    pub async fn collect(&self, content_id: &str, creator_id: &str) -> CommunitySignal {
        let votes = match self.store.votes_for_content(content_id).await {
            Ok(votes) => votes,
            Err(e) => {
                warn!(content_id, collector = "community", error = %e, "Vote fetch failed");
                Vec::new()
            }
        };
        let mut community = aggregate_votes(&votes);

        let Some(reputation) = &self.reputation else {
            return community;
        };
        let Some(handle) = self.resolve_handle(creator_id).await else {
            return community;
        };

        let (block, warn_list) = tokio::join!(
            self.fetch(reputation.as_ref(), ReputationList::Block),
            self.fetch(reputation.as_ref(), ReputationList::Warn),
        );

        let membership = if contains_handle(&block, &handle) {
            Some((ReputationList::Block, self.policy.block_boost))
        } else if contains_handle(&warn_list, &handle) {
            Some((ReputationList::Warn, self.policy.warn_boost))
        } else {
            None
        };

        if let Some((list, boost)) = membership {
            debug!(
                content_id,
                creator_id,
                handle = %handle,
                list = list.as_str(),
                "Creator on reputation list"
            );
            let signal = &mut community.signal;
            signal.score = (signal.score + boost).clamp(0.0, 1.0);
            signal.strength = Strength::High;
            signal.message = format!(
                "{} Creator @{handle} is on the external {} list.",
                signal.message,
                list.as_str()
            );
            community.reputation = Some(list);
        }

        community
    }

    /// Comparable handle for a creator id, if the platform supports one.
    async fn resolve_handle(&self, creator_id: &str) -> Option<String> {
        let creator = CreatorRef::parse(creator_id)?;
        let raw = match creator.platform {
            Platform::Instagram | Platform::Tiktok => creator.native_id,
            Platform::Youtube => {
                let directory = self.directory.as_ref()?;
                let lookup = directory.handle_for_channel(&creator.native_id);
                match tokio::time::timeout(self.timeout, lookup).await {
                    Ok(Ok(Some(handle))) => handle,
                    Ok(Ok(None)) => return None,
                    Ok(Err(e)) => {
                        warn!(
                            creator_id,
                            collector = "community",
                            error = %e,
                            "Handle lookup failed"
                        );
                        return None;
                    }
                    Err(_) => {
                        warn!(creator_id, collector = "community", "Handle lookup timed out");
                        return None;
                    }
                }
            }
            Platform::Other => return None,
        };

        let handle = normalize_handle(&raw);
        (!handle.is_empty()).then_some(handle)
    }

    async fn fetch(&self, source: &dyn ReputationSource, list: ReputationList) -> Vec<String> {
        match tokio::time::timeout(self.timeout, source.fetch_list(list)).await {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!(
                    list = list.as_str(),
                    collector = "community",
                    error = %e,
                    "Reputation list fetch failed"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    list = list.as_str(),
                    collector = "community",
                    "Reputation list fetch timed out"
                );
                Vec::new()
            }
        }
    }
}
