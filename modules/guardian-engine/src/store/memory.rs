use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use guardian_common::{GuardianError, ListEntry, ListType, ScanResult, Vote, VoteChoice};

use crate::traits::ScanStore;

pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Default)]
struct Inner {
    /// (user, creator_id) → list type
    lists: HashMap<(String, String), ListType>,
    /// content_id → user → vote
    votes: HashMap<String, HashMap<String, Vote>>,
    /// user → most-recent-first results
    history: HashMap<String, VecDeque<ScanResult>>,
}

/// On-disk form. Maps are ordered so snapshots diff cleanly.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    lists: Vec<ListEntry>,
    #[serde(default)]
    votes: Vec<Vote>,
    #[serde(default)]
    history: BTreeMap<String, Vec<ScanResult>>,
}

/// In-process ScanStore. Last-write-wins upserts, bounded per-user history.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    history_cap: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl MemoryStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            history_cap: history_cap.max(1),
        }
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    /// Load a snapshot. A missing file is an empty store.
    pub fn load(path: &Path, history_cap: usize) -> Result<Self, GuardianError> {
        let store = Self::new(history_cap);
        if !path.exists() {
            debug!(path = %path.display(), "No state snapshot, starting empty");
            return Ok(store);
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            GuardianError::Storage(format!("Failed to read {}: {e}", path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            GuardianError::Storage(format!("Malformed state snapshot {}: {e}", path.display()))
        })?;

        {
            let mut inner = store.write();
            for entry in snapshot.lists {
                inner
                    .lists
                    .insert((entry.user_fingerprint, entry.creator_id), entry.list_type);
            }
            for vote in snapshot.votes {
                inner
                    .votes
                    .entry(vote.content_id.clone())
                    .or_default()
                    .insert(vote.user_fingerprint.clone(), vote);
            }
            for (user, mut results) in snapshot.history {
                results.truncate(store.history_cap);
                inner.history.insert(user, results.into());
            }
        }

        info!(path = %path.display(), "Loaded state snapshot");
        Ok(store)
    }

    /// Write a snapshot atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), GuardianError> {
        let snapshot = {
            let inner = self.read();
            let mut lists: Vec<ListEntry> = inner
                .lists
                .iter()
                .map(|((user, creator), list_type)| ListEntry {
                    user_fingerprint: user.clone(),
                    creator_id: creator.clone(),
                    list_type: *list_type,
                })
                .collect();
            lists.sort_by(|a, b| {
                (&a.user_fingerprint, &a.creator_id).cmp(&(&b.user_fingerprint, &b.creator_id))
            });

            let mut votes: Vec<Vote> = inner
                .votes
                .values()
                .flat_map(|by_user| by_user.values().cloned())
                .collect();
            votes.sort_by(|a, b| {
                (&a.content_id, &a.user_fingerprint).cmp(&(&b.content_id, &b.user_fingerprint))
            });

            let history = inner
                .history
                .iter()
                .map(|(user, results)| (user.clone(), results.iter().cloned().collect()))
                .collect();

            Snapshot {
                lists,
                votes,
                history,
            }
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| GuardianError::Storage(format!("Failed to encode snapshot: {e}")))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(|e| {
                GuardianError::Storage(format!("Failed to write {}: {e}", path.display()))
            })?;

        debug!(path = %path.display(), "Saved state snapshot");
        Ok(())
    }

    // A poisoned lock still holds consistent data: every mutation is a single insert/remove.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn list_override(&self, user: &str, creator_id: &str) -> Result<Option<ListType>> {
        let key = (user.to_string(), creator_id.to_string());
        Ok(self.read().lists.get(&key).copied())
    }

    async fn upsert_list_entry(&self, entry: ListEntry) -> Result<()> {
        self.write()
            .lists
            .insert((entry.user_fingerprint, entry.creator_id), entry.list_type);
        Ok(())
    }

    async fn list_entries(&self, user: &str) -> Result<Vec<ListEntry>> {
        let mut entries: Vec<ListEntry> = self
            .read()
            .lists
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|((u, creator), list_type)| ListEntry {
                user_fingerprint: u.clone(),
                creator_id: creator.clone(),
                list_type: *list_type,
            })
            .collect();
        entries.sort_by(|a, b| a.creator_id.cmp(&b.creator_id));
        Ok(entries)
    }

    async fn remove_list_entry(&self, user: &str, creator_id: &str) -> Result<()> {
        let key = (user.to_string(), creator_id.to_string());
        self.write().lists.remove(&key);
        Ok(())
    }

    async fn upsert_vote(
        &self,
        content_id: &str,
        user: &str,
        vote: VoteChoice,
        weight: f64,
    ) -> Result<()> {
        let record = Vote {
            content_id: content_id.to_string(),
            user_fingerprint: user.to_string(),
            vote,
            weight,
            created_at: Utc::now(),
        };
        self.write()
            .votes
            .entry(content_id.to_string())
            .or_default()
            .insert(user.to_string(), record);
        Ok(())
    }

    async fn votes_for_content(&self, content_id: &str) -> Result<Vec<Vote>> {
        let mut votes: Vec<Vote> = self
            .read()
            .votes
            .get(content_id)
            .map(|by_user| by_user.values().cloned().collect())
            .unwrap_or_default();
        votes.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_fingerprint.cmp(&b.user_fingerprint))
        });
        Ok(votes)
    }

    async fn append_history(
        &self,
        content_id: &str,
        user: &str,
        result: &ScanResult,
    ) -> Result<()> {
        let mut inner = self.write();
        let entries = inner.history.entry(user.to_string()).or_default();
        entries.push_front(result.clone());
        entries.truncate(self.history_cap);
        debug!(content_id, user, len = entries.len(), "Appended scan history");
        Ok(())
    }

    async fn history(&self, user: &str) -> Result<Vec<ScanResult>> {
        Ok(self
            .read()
            .history
            .get(user)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default())
    }
}
