use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bookkeeping for "active analysis" of one league. Not a real process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerRecord {
    pub id: Uuid,
    pub league: String,
    pub spawned_at: DateTime<Utc>,
    pub status: WorkerStatus,
    pub games_collected: u64,
    pub predictions_made: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Spawned,
    Active,
}

impl WorkerRecord {
    pub fn new(league: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            league: league.into(),
            spawned_at: Utc::now(),
            status: WorkerStatus::Spawned,
            games_collected: 0,
            predictions_made: 0,
            last_activity: None,
        }
    }

    pub fn record_cycle(&mut self, match_count: usize, at: DateTime<Utc>) {
        let count = match_count as u64;
        self.games_collected += count;
        self.predictions_made += count;
        self.status = WorkerStatus::Active;
        self.last_activity = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_cycle_accumulates() {
        let mut worker = WorkerRecord::new("nba");
        assert_eq!(worker.status, WorkerStatus::Spawned);

        worker.record_cycle(4, Utc::now());
        worker.record_cycle(3, Utc::now());

        assert_eq!(worker.games_collected, 7);
        assert_eq!(worker.predictions_made, 7);
        assert_eq!(worker.status, WorkerStatus::Active);
        assert!(worker.last_activity.is_some());
    }
}
