//! Durable ledger of already-published links.
//!
//! Identity is a SHA-256 digest of the trimmed link, so keys are stable
//! across runs and bounded in size regardless of URL length. The ledger is
//! an append-only JSON file rewritten on each record; each run opens it
//! fresh. Read failures degrade to an empty store rather than blocking the
//! run — duplicate posting is the accepted cost of a corrupted ledger, and
//! it is logged loudly.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::error::Error;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::models::PostedRecord;

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    records: Vec<PostedRecord>,
    seen: HashSet<String>,
}

impl DedupStore {
    /// Open the ledger at `path`. Missing file means a fresh store;
    /// unreadable content is logged and treated the same way.
    pub fn load(path: &str) -> Self {
        let records = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Vec<PostedRecord>>(&text) {
                Ok(records) => records,
                Err(e) => {
                    warn!(%path, error = %e, "Posted ledger unreadable; starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(%path, "No posted ledger yet; starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(%path, error = %e, "Cannot read posted ledger; starting empty");
                Vec::new()
            }
        };
        let seen = records.iter().map(|r| r.id.clone()).collect();
        Self {
            path: PathBuf::from(path),
            records,
            seen,
        }
    }

    /// Stable identity key for a link.
    pub fn link_id(link: &str) -> String {
        format!("{:x}", Sha256::digest(link.trim().as_bytes()))
    }

    /// Has this link already been published?
    pub fn seen(&self, link: &str) -> bool {
        self.seen.contains(&Self::link_id(link))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a successfully published link and persist the ledger.
    ///
    /// Idempotent: recording a link that is already present is a no-op.
    /// A write failure surfaces as an error for the caller to log; the
    /// in-memory set keeps the entry either way so the current run never
    /// re-publishes it.
    pub async fn record(
        &mut self,
        link: &str,
        title: &str,
        published: Option<DateTime<Utc>>,
    ) -> Result<(), Box<dyn Error>> {
        let id = Self::link_id(link);
        if !self.seen.insert(id.clone()) {
            return Ok(());
        }
        self.records.push(PostedRecord {
            id,
            link: link.trim().to_string(),
            title: title.to_string(),
            published_at: published,
            recorded_at: Utc::now(),
        });
        let json = serde_json::to_string_pretty(&self.records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ledger(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("autopost-dedup-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_link_id_is_stable_sha256() {
        let id = DedupStore::link_id("https://example.com/a");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, DedupStore::link_id("  https://example.com/a  "));
        assert_ne!(id, DedupStore::link_id("https://example.com/b"));
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let store = DedupStore::load(&temp_ledger("missing"));
        assert!(store.is_empty());
        assert!(!store.seen("https://example.com/a"));
    }

    #[test]
    fn test_corrupt_file_is_empty_store() {
        let path = temp_ledger("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let store = DedupStore::load(&path);
        assert!(store.is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_record_persists_and_reloads() {
        let path = temp_ledger("roundtrip");
        let _ = std::fs::remove_file(&path);

        let mut store = DedupStore::load(&path);
        store
            .record("https://example.com/a", "Title A", None)
            .await
            .unwrap();
        assert!(store.seen("https://example.com/a"));
        assert_eq!(store.len(), 1);

        let reloaded = DedupStore::load(&path);
        assert!(reloaded.seen("https://example.com/a"));
        assert!(!reloaded.seen("https://example.com/b"));
        assert_eq!(reloaded.len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let path = temp_ledger("idempotent");
        let _ = std::fs::remove_file(&path);

        let mut store = DedupStore::load(&path);
        store.record("https://example.com/a", "A", None).await.unwrap();
        store.record("https://example.com/a", "A again", None).await.unwrap();
        assert_eq!(store.len(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
