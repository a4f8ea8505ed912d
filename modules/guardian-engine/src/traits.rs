// Trait abstractions for the scan pipeline's collaborators.
//
// ScanStore: votes, list overrides and history. Persistence lives behind it.
// DisclosureProvider: platform synthetic-media disclosure metadata.
// CreatorDirectory: channel lookup and handle resolution for creators.
// ReputationSource: externally hosted block/warn lists of creator handles.
// ModelInference: the model inference service.
//
// Collectors hold these as Arc<dyn _>, so tests swap in the mocks from
// `testing` and the scan runs with no network at all.

use anyhow::Result;
use async_trait::async_trait;

use guardian_common::{ListEntry, ListType, ReputationList, ScanResult, Vote, VoteChoice};
use inference_client::{InferenceClient, InferenceResponse, MediaKind};
use youtube_client::{SyntheticDisclosure, YoutubeClient};

// ---------------------------------------------------------------------------
// ScanStore
// ---------------------------------------------------------------------------

/// Storage contract. Upserts are last-write-wins on their key:
/// `(content_id, user)` for votes, `(user, creator_id)` for list entries.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// The caller's allow/block override for a creator, if any.
    async fn list_override(&self, user: &str, creator_id: &str) -> Result<Option<ListType>>;

    async fn upsert_list_entry(&self, entry: ListEntry) -> Result<()>;

    /// All list entries for a user, sorted by creator id.
    async fn list_entries(&self, user: &str) -> Result<Vec<ListEntry>>;

    /// Remove a list entry. Removing a missing entry is not an error.
    async fn remove_list_entry(&self, user: &str, creator_id: &str) -> Result<()>;

    async fn upsert_vote(
        &self,
        content_id: &str,
        user: &str,
        vote: VoteChoice,
        weight: f64,
    ) -> Result<()>;

    /// Votes for a content id in a stable order (oldest first).
    async fn votes_for_content(&self, content_id: &str) -> Result<Vec<Vote>>;

    /// Insert at the front of the user's history, evicting beyond the cap.
    async fn append_history(&self, content_id: &str, user: &str, result: &ScanResult)
        -> Result<()>;

    /// Most-recent-first history for a user.
    async fn history(&self, user: &str) -> Result<Vec<ScanResult>>;
}

// ---------------------------------------------------------------------------
// DisclosureProvider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DisclosureProvider: Send + Sync {
    /// Tri-state synthetic-media flag: `Some(true)` declared, `Some(false)`
    /// denied, `None` unknown. `Err` means the metadata was unavailable.
    async fn synthetic_disclosure(&self, canonical_id: &str) -> Result<Option<bool>>;
}

#[async_trait]
impl DisclosureProvider for YoutubeClient {
    async fn synthetic_disclosure(&self, canonical_id: &str) -> Result<Option<bool>> {
        let disclosure = YoutubeClient::synthetic_disclosure(self, canonical_id).await?;
        Ok(match disclosure {
            SyntheticDisclosure::Declared => Some(true),
            SyntheticDisclosure::Denied => Some(false),
            SyntheticDisclosure::Unknown => None,
        })
    }
}

// ---------------------------------------------------------------------------
// CreatorDirectory
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CreatorDirectory: Send + Sync {
    /// The channel that published a piece of content.
    async fn channel_for_content(&self, canonical_id: &str) -> Result<Option<String>>;

    /// A comparable handle for a channel (e.g. "@somecreator").
    async fn handle_for_channel(&self, channel_id: &str) -> Result<Option<String>>;
}

#[async_trait]
impl CreatorDirectory for YoutubeClient {
    async fn channel_for_content(&self, canonical_id: &str) -> Result<Option<String>> {
        Ok(self.channel_for_video(canonical_id).await?)
    }

    async fn handle_for_channel(&self, channel_id: &str) -> Result<Option<String>> {
        Ok(self.channel_handle(channel_id).await?)
    }
}

// ---------------------------------------------------------------------------
// ReputationSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Raw entries of one list (handles, possibly `@`-prefixed, any case).
    async fn fetch_list(&self, list: ReputationList) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// ModelInference
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ModelInference: Send + Sync {
    async fn infer(&self, media_url: &str, kind: MediaKind) -> Result<InferenceResponse>;
}

#[async_trait]
impl ModelInference for InferenceClient {
    async fn infer(&self, media_url: &str, kind: MediaKind) -> Result<InferenceResponse> {
        Ok(InferenceClient::infer(self, media_url, kind).await?)
    }
}
