use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tipster_models::ScoredMatch;

/// The scored fixtures of the most recent successful selection.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSnapshot {
    pub league: String,
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
    pub matches: Vec<ScoredMatch>,
}

impl MatchSnapshot {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }
}

/// Holds one league's matches at a time. A new selection replaces the snapshot
/// wholesale; readers always see a complete snapshot, never a partial one.
#[derive(Default)]
pub struct MatchCache {
    current: RwLock<Option<MatchSnapshot>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot it displaced.
    pub fn replace(&self, snapshot: MatchSnapshot) -> Option<MatchSnapshot> {
        self.current.write().replace(snapshot)
    }

    pub fn current(&self) -> Option<MatchSnapshot> {
        self.current.read().clone()
    }

    pub fn get(&self, league: &str) -> Option<MatchSnapshot> {
        self.current
            .read()
            .as_ref()
            .filter(|s| s.league == league)
            .cloned()
    }

    pub fn fresh(&self, league: &str, now: DateTime<Utc>, ttl: Duration) -> Option<MatchSnapshot> {
        self.get(league).filter(|s| s.is_fresh(now, ttl))
    }

    /// Clears the cache only if it currently holds `league`.
    pub fn invalidate(&self, league: &str) -> bool {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|s| s.league == league) {
            *current = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
