// External reputation lists: newline-delimited creator handles fetched over HTTP.
//
// Lists are cached for LIST_CACHE_TTL. A failed refresh serves the stale copy
// when there is one; with no copy at all the error goes to the caller, which
// treats it as "no match". Requests give up at REFRESH_SHARE of the caller's
// bound so a slow refresh still has time to fall back to the stale copy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use guardian_common::ReputationList;

use crate::traits::ReputationSource;

pub const LIST_CACHE_TTL: Duration = Duration::from_secs(300);
const REFRESH_SHARE: f64 = 0.8;

/// Per-request HTTP timeout for a caller that waits at most `bound`.
pub fn request_timeout(bound: Duration) -> Duration {
    bound.mul_f64(REFRESH_SHARE)
}

/// Canonical comparable form of a handle: trimmed, no leading `@`, lowercase.
pub fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Parse a newline-delimited list body. Blank lines and `#` comments are skipped.
pub fn parse_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_handle)
        .filter(|handle| !handle.is_empty())
        .collect()
}

/// Case-insensitive membership test against raw list entries.
pub fn contains_handle(entries: &[String], handle: &str) -> bool {
    let wanted = normalize_handle(handle);
    !wanted.is_empty() && entries.iter().any(|e| normalize_handle(e) == wanted)
}

struct CachedList {
    fetched_at: Instant,
    entries: Vec<String>,
}

pub struct HttpReputationLists {
    client: reqwest::Client,
    block_url: Option<String>,
    warn_url: Option<String>,
    cache: RwLock<HashMap<ReputationList, CachedList>>,
}

impl HttpReputationLists {
    /// `bound` is how long the caller waits for `fetch_list`.
    pub fn new(
        block_url: Option<String>,
        warn_url: Option<String>,
        bound: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout(bound))
            .build()
            .context("Failed to build reputation list HTTP client")?;

        Ok(Self {
            client,
            block_url,
            warn_url,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn url_for(&self, list: ReputationList) -> Option<&str> {
        match list {
            ReputationList::Block => self.block_url.as_deref(),
            ReputationList::Warn => self.warn_url.as_deref(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<String>> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("reputation list {url} returned status {}", status.as_u16());
        }
        Ok(parse_list(&resp.text().await?))
    }
}

#[async_trait]
impl ReputationSource for HttpReputationLists {
    async fn fetch_list(&self, list: ReputationList) -> Result<Vec<String>> {
        let Some(url) = self.url_for(list) else {
            return Ok(Vec::new());
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&list) {
                if cached.fetched_at.elapsed() < LIST_CACHE_TTL {
                    return Ok(cached.entries.clone());
                }
            }
        }

        match self.download(url).await {
            Ok(entries) => {
                debug!(list = list.as_str(), count = entries.len(), "Fetched reputation list");
                self.cache.write().await.insert(
                    list,
                    CachedList {
                        fetched_at: Instant::now(),
                        entries: entries.clone(),
                    },
                );
                Ok(entries)
            }
            Err(e) => {
                let cache = self.cache.read().await;
                match cache.get(&list) {
                    Some(stale) => {
                        warn!(
                            list = list.as_str(),
                            error = %e,
                            "List refresh failed, serving stale copy"
                        );
                        Ok(stale.entries.clone())
                    }
                    None => Err(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blanks_and_comments() {
        let body = "# block list v3\n@SpamFarm\n\n  deepfaker  \n#trailing\nAnother_One\r\n";
        assert_eq!(parse_list(body), vec!["spamfarm", "deepfaker", "another_one"]);
    }

    #[test]
    fn membership_is_case_insensitive() {
        let entries = vec!["@SpamFarm".to_string(), "deepfaker".to_string()];
        assert!(contains_handle(&entries, "spamfarm"));
        assert!(contains_handle(&entries, "@DeepFaker"));
        assert!(!contains_handle(&entries, "honest_creator"));
        assert!(!contains_handle(&entries, "@"));
    }

    #[test]
    fn requests_finish_inside_the_caller_bound() {
        let bound = Duration::from_secs(5);
        assert!(request_timeout(bound) < bound);
        assert_eq!(request_timeout(bound), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn slow_refresh_serves_stale_copy_within_bound() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let bound = Duration::from_millis(500);
        let lists =
            HttpReputationLists::new(Some(format!("http://{addr}/block.txt")), None, bound)
                .unwrap();
        let expired = Instant::now()
            .checked_sub(LIST_CACHE_TTL + Duration::from_secs(1))
            .unwrap();
        lists.cache.write().await.insert(
            ReputationList::Block,
            CachedList {
                fetched_at: expired,
                entries: vec!["spamfarm".to_string()],
            },
        );

        let served = tokio::time::timeout(bound, lists.fetch_list(ReputationList::Block))
            .await
            .expect("refresh should give up before the caller does")
            .unwrap();
        assert_eq!(served, vec!["spamfarm"]);
    }

    #[tokio::test]
    async fn unconfigured_list_is_empty() {
        let lists = HttpReputationLists::new(None, None, Duration::from_secs(1)).unwrap();
        assert!(lists.fetch_list(ReputationList::Block).await.unwrap().is_empty());
        assert!(lists.fetch_list(ReputationList::Warn).await.unwrap().is_empty());
    }
}
