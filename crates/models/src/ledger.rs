use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use crate::events::{Score, Side};
use crate::predictions::ScoredMatch;

/// One stored prediction. Starts pending and is completed exactly once by grading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub match_id: String,
    /// Match day, not the day the prediction was made.
    pub date: NaiveDate,
    pub league: String,
    pub matchup_label: String,
    pub scheduled_time: DateTime<Utc>,
    pub pick: Side,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    /// `None` until graded.
    pub graded_correct: Option<bool>,
    pub actual_outcome: Option<Side>,
    #[serde(default)]
    pub final_score: Option<Score>,
    #[serde(default)]
    pub graded_at: Option<DateTime<Utc>>,
}

impl PredictionRecord {
    pub fn from_scored(scored: &ScoredMatch, created_at: DateTime<Utc>) -> Self {
        let fixture = &scored.fixture;
        Self {
            match_id: fixture.id.clone(),
            date: fixture.match_day(),
            league: fixture.league.clone(),
            matchup_label: fixture.matchup_label(),
            scheduled_time: fixture.scheduled_time,
            pick: scored.consensus.pick,
            confidence: scored.consensus.confidence,
            created_at,
            completed: false,
            graded_correct: None,
            actual_outcome: None,
            final_score: None,
            graded_at: None,
        }
    }

    /// Pending and far enough past kickoff that a result should exist.
    pub fn is_due(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        !self.completed && self.scheduled_time + grace <= now
    }

    fn same_grade(&self, other: &PredictionRecord) -> bool {
        self.actual_outcome == other.actual_outcome && self.final_score == other.final_score
    }
}

/// Summary of one `Ledger::merge` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeReport {
    /// New pending records.
    pub inserted: usize,
    /// Pending records replaced by a newer prediction.
    pub updated: usize,
    /// Stale pending records no longer in the incoming set.
    pub dropped: usize,
    /// Incoming records discarded because the match is already graded.
    pub protected: usize,
    /// Incoming completed records disagreeing with the stored grade.
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grade {
    pub date: NaiveDate,
    pub match_id: String,
    pub outcome: Side,
    pub final_score: Score,
    pub graded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeOutcome {
    Graded { correct: bool },
    AlreadyCompleted,
    Conflict,
    NotFound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccuracyStats {
    pub graded: u64,
    pub correct: u64,
    pub pending: u64,
    /// In `[0,100]`; zero until something is graded.
    pub accuracy_pct: f64,
}

impl AccuracyStats {
    pub fn record(&mut self, correct: bool) {
        self.graded += 1;
        if correct {
            self.correct += 1;
        }
        self.refresh();
    }

    pub fn absorb(&mut self, other: &AccuracyStats) {
        self.graded += other.graded;
        self.correct += other.correct;
        self.pending += other.pending;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.accuracy_pct = if self.graded == 0 {
            0.0
        } else {
            self.correct as f64 / self.graded as f64 * 100.0
        };
    }
}

/// Date-keyed prediction history. Serializes as `{"YYYY-MM-DD": [record, ...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Ledger {
    days: BTreeMap<NaiveDate, Vec<PredictionRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, date: NaiveDate) -> &[PredictionRecord] {
        self.days.get(&date).map_or(&[], Vec::as_slice)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &PredictionRecord> {
        self.days.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Folds a fresh batch of predictions into one match day.
    ///
    /// Completed records are never touched. The day's pending set is replaced by the
    /// incoming batch (deduplicated by `match_id`, last write wins), minus anything that
    /// is already graded. A replaced pending record keeps its original `created_at`.
    pub fn merge(&mut self, date: NaiveDate, incoming: Vec<PredictionRecord>) -> MergeReport {
        let existing = self.days.remove(&date).unwrap_or_default();
        let (completed, pending): (Vec<_>, Vec<_>) =
            existing.into_iter().partition(|r| r.completed);

        let completed_index: HashMap<String, usize> = completed
            .iter()
            .enumerate()
            .map(|(i, r)| (r.match_id.clone(), i))
            .collect();
        let pending_created: HashMap<&str, DateTime<Utc>> = pending
            .iter()
            .map(|r| (r.match_id.as_str(), r.created_at))
            .collect();

        let mut report = MergeReport::default();
        let mut next_pending: Vec<PredictionRecord> = Vec::with_capacity(incoming.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for mut record in incoming {
            record.date = date;

            if let Some(&idx) = completed_index.get(&record.match_id) {
                if record.completed && !completed[idx].same_grade(&record) {
                    report.conflicts.push(record.match_id.clone());
                }
                report.protected += 1;
                continue;
            }

            if let Some(created_at) = pending_created.get(record.match_id.as_str()) {
                record.created_at = *created_at;
            }

            match positions.get(&record.match_id).copied() {
                Some(pos) if next_pending[pos].completed => report.protected += 1,
                Some(pos) => next_pending[pos] = record,
                None => {
                    positions.insert(record.match_id.clone(), next_pending.len());
                    next_pending.push(record);
                }
            }
        }

        for record in &next_pending {
            if pending_created.contains_key(record.match_id.as_str()) {
                report.updated += 1;
            } else {
                report.inserted += 1;
            }
        }
        report.dropped = pending
            .iter()
            .filter(|r| !positions.contains_key(&r.match_id))
            .map(|r| r.match_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let mut merged = completed;
        merged.extend(next_pending);
        if !merged.is_empty() {
            self.days.insert(date, merged);
        }

        report
    }

    /// Completes a pending record. A completed record is never modified.
    pub fn apply_grade(&mut self, grade: &Grade) -> GradeOutcome {
        let Some(record) = self
            .days
            .get_mut(&grade.date)
            .and_then(|day| day.iter_mut().find(|r| r.match_id == grade.match_id))
        else {
            return GradeOutcome::NotFound;
        };

        if record.completed {
            return if record.actual_outcome == Some(grade.outcome) {
                GradeOutcome::AlreadyCompleted
            } else {
                GradeOutcome::Conflict
            };
        }

        let correct = record.pick == grade.outcome;
        record.completed = true;
        record.actual_outcome = Some(grade.outcome);
        record.graded_correct = Some(correct);
        record.final_score = Some(grade.final_score);
        record.graded_at = Some(grade.graded_at);

        GradeOutcome::Graded { correct }
    }

    pub fn pending_due(&self, now: DateTime<Utc>, grace: Duration) -> Vec<PredictionRecord> {
        self.records()
            .filter(|r| r.is_due(now, grace))
            .cloned()
            .collect()
    }

    pub fn accuracy(&self) -> AccuracyStats {
        self.accuracy_since(NaiveDate::MIN)
    }

    /// Accuracy over match days on or after `from`.
    pub fn accuracy_since(&self, from: NaiveDate) -> AccuracyStats {
        let mut stats = AccuracyStats::default();
        for record in self.days.range(from..).flat_map(|(_, day)| day) {
            match record.graded_correct {
                Some(correct) if record.completed => stats.record(correct),
                _ => stats.pending += 1,
            }
        }
        stats
    }
}
