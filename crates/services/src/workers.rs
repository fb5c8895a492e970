use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tipster_models::WorkerRecord;
use tracing::info;

/// At most one worker record per league.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: DashMap<String, WorkerRecord>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn-if-missing and record one cycle under a single entry lock. The flag says
    /// whether a new record was created.
    pub fn activate(&self, league: &str, match_count: usize, at: DateTime<Utc>) -> (WorkerRecord, bool) {
        let mut created = false;
        let mut entry = self.workers.entry(league.to_string()).or_insert_with(|| {
            created = true;
            WorkerRecord::new(league)
        });
        entry.record_cycle(match_count, at);
        let record = entry.clone();
        drop(entry);

        if created {
            info!("🧵 Spawned worker {} for {}", record.id, league);
        }
        (record, created)
    }

    pub fn get(&self, league: &str) -> Option<WorkerRecord> {
        self.workers.get(league).map(|w| w.clone())
    }

    /// Sorted by league id.
    pub fn list(&self) -> Vec<WorkerRecord> {
        let mut workers: Vec<WorkerRecord> = self.workers.iter().map(|w| w.value().clone()).collect();
        workers.sort_by(|a, b| a.league.cmp(&b.league));
        workers
    }

    /// Removes every record and returns how many there were.
    pub fn kill_all(&self) -> usize {
        let count = self.workers.len();
        self.workers.clear();
        info!("🛑 Killed {} workers", count);
        count
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
