use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tipster_models::{
    AccuracyStats, Grade, GradeOutcome, Ledger, MergeReport, PredictionRecord, Result, TipsterError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::store::LedgerStore;

/// Totals from applying a batch of grades.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeReport {
    pub graded: usize,
    pub correct: usize,
    pub already_completed: usize,
    pub conflicts: usize,
    pub not_found: usize,
}

/// Serializes every read-modify-write of a league's ledger behind one async lock, so
/// concurrent merges and gradings cannot interleave.
pub struct LedgerRepository {
    store: Arc<dyn LedgerStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LedgerRepository {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, league: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(league.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn merge(&self, league: &str, date: NaiveDate, records: Vec<PredictionRecord>) -> Result<MergeReport> {
        let lock = self.lock_for(league);
        let _guard = lock.lock().await;

        let mut ledger = self.store.load(league).await?;
        let report = ledger.merge(date, records);

        for match_id in &report.conflicts {
            let conflict = TipsterError::LedgerConflict {
                date: date.to_string(),
                match_id: match_id.clone(),
            };
            warn!("⚠️ {}", conflict);
        }

        self.store.save(league, &ledger).await?;
        debug!(
            league,
            %date,
            inserted = report.inserted,
            updated = report.updated,
            dropped = report.dropped,
            protected = report.protected,
            "📒 Ledger merge"
        );
        Ok(report)
    }

    /// Groups records by match day and merges each day.
    pub async fn merge_all(&self, league: &str, records: Vec<PredictionRecord>) -> Result<MergeReport> {
        let mut by_day: BTreeMap<NaiveDate, Vec<PredictionRecord>> = BTreeMap::new();
        for record in records {
            by_day.entry(record.date).or_default().push(record);
        }

        let mut total = MergeReport::default();
        for (date, day_records) in by_day {
            let report = self.merge(league, date, day_records).await?;
            total.inserted += report.inserted;
            total.updated += report.updated;
            total.dropped += report.dropped;
            total.protected += report.protected;
            total.conflicts.extend(report.conflicts);
        }
        Ok(total)
    }

    pub async fn apply_grades(&self, league: &str, grades: &[Grade]) -> Result<GradeReport> {
        if grades.is_empty() {
            return Ok(GradeReport::default());
        }

        let lock = self.lock_for(league);
        let _guard = lock.lock().await;

        let mut ledger = self.store.load(league).await?;
        let mut report = GradeReport::default();

        for grade in grades {
            match ledger.apply_grade(grade) {
                GradeOutcome::Graded { correct } => {
                    report.graded += 1;
                    if correct {
                        report.correct += 1;
                    }
                }
                GradeOutcome::AlreadyCompleted => report.already_completed += 1,
                GradeOutcome::Conflict => {
                    report.conflicts += 1;
                    let conflict = TipsterError::LedgerConflict {
                        date: grade.date.to_string(),
                        match_id: grade.match_id.clone(),
                    };
                    warn!("⚠️ {}", conflict);
                }
                GradeOutcome::NotFound => report.not_found += 1,
            }
        }

        if report.graded > 0 {
            self.store.save(league, &ledger).await?;
            info!("✅ Graded {} predictions for {} ({} correct)", report.graded, league, report.correct);
        }
        Ok(report)
    }

    pub async fn snapshot(&self, league: &str) -> Result<Ledger> {
        self.store.load(league).await
    }

    pub async fn leagues(&self) -> Result<Vec<String>> {
        self.store.leagues().await
    }

    pub async fn pending_due(&self, league: &str, now: DateTime<Utc>, grace: Duration) -> Result<Vec<PredictionRecord>> {
        Ok(self.store.load(league).await?.pending_due(now, grace))
    }

    pub async fn accuracy(&self, league: &str) -> Result<AccuracyStats> {
        Ok(self.store.load(league).await?.accuracy())
    }

    /// Overall accuracy plus a per-league breakdown.
    pub async fn accuracy_report(&self) -> Result<(AccuracyStats, BTreeMap<String, AccuracyStats>)> {
        let mut overall = AccuracyStats::default();
        let mut per_league = BTreeMap::new();

        for league in self.leagues().await? {
            let stats = self.accuracy(&league).await?;
            overall.absorb(&stats);
            per_league.insert(league, stats);
        }
        Ok((overall, per_league))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedgerStore;
    use chrono::TimeZone;
    use tipster_models::{Score, Side};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()
    }

    fn record(match_id: &str, date: NaiveDate, pick: Side) -> PredictionRecord {
        PredictionRecord {
            match_id: match_id.to_string(),
            date,
            league: "epl".to_string(),
            matchup_label: "A vs B".to_string(),
            scheduled_time: date.and_hms_opt(15, 0, 0).unwrap().and_utc(),
            pick,
            confidence: 55.0,
            created_at: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
            completed: false,
            graded_correct: None,
            actual_outcome: None,
            final_score: None,
            graded_at: None,
        }
    }

    fn grade(match_id: &str, home: u16, away: u16) -> Grade {
        let score = Score::new(home, away);
        Grade {
            date: day(),
            match_id: match_id.to_string(),
            outcome: score.outcome(),
            final_score: score,
            graded_at: Utc::now(),
        }
    }

    fn repository() -> LedgerRepository {
        LedgerRepository::new(Arc::new(MemoryLedgerStore::new()))
    }

    #[tokio::test]
    async fn test_merge_all_splits_by_day() {
        let repo = repository();
        let next = day().succ_opt().unwrap();

        let report = repo
            .merge_all("epl", vec![record("1", day(), Side::Home), record("2", next, Side::Away)])
            .await
            .unwrap();

        assert_eq!(report.inserted, 2);
        let ledger = repo.snapshot("epl").await.unwrap();
        assert_eq!(ledger.day(day()).len(), 1);
        assert_eq!(ledger.day(next).len(), 1);
    }

    #[tokio::test]
    async fn test_grades_persist_and_feed_accuracy() {
        let repo = repository();
        repo.merge("epl", day(), vec![record("1", day(), Side::Home), record("2", day(), Side::Home)])
            .await
            .unwrap();

        let report = repo
            .apply_grades("epl", &[grade("1", 2, 1), grade("2", 0, 0), grade("3", 1, 0)])
            .await
            .unwrap();
        assert_eq!(report.graded, 2);
        assert_eq!(report.correct, 1);
        assert_eq!(report.not_found, 1);

        let again = repo.apply_grades("epl", &[grade("1", 2, 1), grade("2", 1, 0)]).await.unwrap();
        assert_eq!(again.already_completed, 1);
        assert_eq!(again.conflicts, 1);

        let stats = repo.accuracy("epl").await.unwrap();
        assert_eq!(stats.graded, 2);
        assert!((stats.accuracy_pct - 50.0).abs() < 1e-9);

        let (overall, per_league) = repo.accuracy_report().await.unwrap();
        assert_eq!(overall.graded, 2);
        assert!(per_league.contains_key("epl"));
    }

    #[tokio::test]
    async fn test_concurrent_merges_are_serialized() {
        let repo = Arc::new(repository());
        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let date = day() + Duration::days(i);
                repo.merge("epl", date, vec![record(&format!("m{i}"), date, Side::Home)]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.snapshot("epl").await.unwrap().len(), 8);
    }
}
