// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Bounded, persisted list of past results.
//!
//! The ledger does no deduplication of its own: the session manager calls
//! [`ScoreLedger::record`] at most once per session.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::phase::Outcome;
use crate::store::KeyValueStore;

/// Storage key of the score list.
pub const SCORES_KEY: &str = "qracing.scores";

/// Number of results kept.
pub const MAX_ENTRIES: usize = 10;

/// One finished race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: String,
    pub score: i64,
    pub outcome: Outcome,
    /// UTC milliseconds since the epoch.
    pub timestamp_ms: i64,
    pub player_name: String,
}

pub struct ScoreLedger<S> {
    store: S,
}

impl<S: KeyValueStore> ScoreLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persisted results, most recent first. Missing or unreadable data
    /// loads as an empty list.
    pub fn load(&self) -> Vec<ScoreRecord> {
        let raw = match self.store.get(SCORES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("score list unreadable ({e}), treating as empty");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("score list corrupt ({e}), treating as empty");
            Vec::new()
        })
    }

    /// Prepend a new result, keep the newest [`MAX_ENTRIES`], persist.
    ///
    /// Load, modify and store happen in one `&mut self` call; callers that
    /// share a ledger across threads must wrap it in a mutex.
    pub fn record(
        &mut self,
        score: i64,
        won: bool,
        player_name: &str,
    ) -> Result<ScoreRecord, LedgerError> {
        let record = ScoreRecord {
            id: Uuid::new_v4().to_string(),
            score,
            outcome: if won { Outcome::Won } else { Outcome::Lost },
            timestamp_ms: Utc::now().timestamp_millis(),
            player_name: player_name.to_string(),
        };

        let mut entries = self.load();
        entries.insert(0, record.clone());
        entries.truncate(MAX_ENTRIES);
        self.store.set(SCORES_KEY, serde_json::to_string(&entries)?)?;

        info!(score, outcome = %record.outcome, player = player_name, "score recorded");
        Ok(record)
    }

    /// Empty the list and persist the empty list.
    pub fn clear(&mut self) -> Result<(), LedgerError> {
        self.store.set(SCORES_KEY, "[]".to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_load_empty() {
        let ledger = ScoreLedger::new(MemoryStore::new());
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_record_prepends() {
        let mut ledger = ScoreLedger::new(MemoryStore::new());
        ledger.record(100, false, "ada").unwrap();
        let latest = ledger.record(900, true, "grace").unwrap();

        let list = ledger.load();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], latest);
        assert_eq!(list[0].outcome, Outcome::Won);
        assert_eq!(list[1].score, 100);
        assert_eq!(list[1].player_name, "ada");
        assert_ne!(list[0].id, list[1].id);
    }

    #[test]
    fn test_keeps_ten_most_recent() {
        let mut ledger = ScoreLedger::new(MemoryStore::new());
        for score in 1..=11 {
            ledger.record(score, score % 2 == 0, "p").unwrap();
        }
        let list = ledger.load();
        assert_eq!(list.len(), MAX_ENTRIES);
        let scores: Vec<i64> = list.iter().map(|r| r.score).collect();
        assert_eq!(scores, (2..=11).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let mut ledger = ScoreLedger::new(MemoryStore::new());
        ledger.record(5, false, "p").unwrap();
        ledger.clear().unwrap();
        assert!(ledger.load().is_empty());
        assert_eq!(
            ledger.store().get(SCORES_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_corrupt_list_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(SCORES_KEY, "{oops".into()).unwrap();
        let mut ledger = ScoreLedger::new(store);
        assert!(ledger.load().is_empty());
        ledger.record(1, true, "p").unwrap();
        assert_eq!(ledger.load().len(), 1);
    }

    #[test]
    fn test_failed_persist_is_not_visible() {
        use crate::store::FileStore;

        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        let mut ledger = ScoreLedger::new(FileStore::open(sub.join("store.json")).unwrap());
        std::fs::write(&sub, "not a directory").unwrap();

        assert!(matches!(
            ledger.record(500, true, "p"),
            Err(LedgerError::Store(_))
        ));
        assert!(ledger.load().is_empty());

        std::fs::remove_file(&sub).unwrap();
        ledger.record(7, false, "p").unwrap();
        let scores: Vec<i64> = ledger.load().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![7]);
    }
}
