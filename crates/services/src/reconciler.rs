use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tipster_db::LedgerRepository;
use tipster_models::{AccuracyStats, Grade, PredictionRecord, Result, Score, Side};
use tracing::{debug, info, warn};
use crate::metrics::PipelineMetrics;
use crate::registry::ResolutionRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Pending records past kickoff plus grace.
    pub examined: usize,
    pub graded: usize,
    pub correct: usize,
    pub still_pending: usize,
}

impl ReconcileReport {
    fn absorb(&mut self, other: &ReconcileReport) {
        self.examined += other.examined;
        self.graded += other.graded;
        self.correct += other.correct;
        self.still_pending += other.still_pending;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccuracyReport {
    pub overall: AccuracyStats,
    pub leagues: BTreeMap<String, AccuracyStats>,
}

/// Grades pending predictions once their matches have a final result. Anything it cannot
/// grade stays pending for the next run.
pub struct ResultReconciler {
    registry: Arc<ResolutionRegistry>,
    ledger: Arc<LedgerRepository>,
    grace: Duration,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl ResultReconciler {
    pub fn new(registry: Arc<ResolutionRegistry>, ledger: Arc<LedgerRepository>, grace: Duration) -> Self {
        Self {
            registry,
            ledger,
            grace,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Every league with a ledger. A league that fails is logged and skipped.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReconcileReport> {
        let mut total = ReconcileReport::default();
        for league in self.ledger.leagues().await? {
            match self.run_for_league(&league, now).await {
                Ok(report) => total.absorb(&report),
                Err(e) => warn!("⚠️ Reconciliation failed for {}: {}", league, e),
            }
        }

        info!(
            examined = total.examined,
            graded = total.graded,
            correct = total.correct,
            "🏁 Reconciliation run complete"
        );
        Ok(total)
    }

    pub async fn run_for_league(&self, league: &str, now: DateTime<Utc>) -> Result<ReconcileReport> {
        let due = self.ledger.pending_due(league, now, self.grace).await?;
        if due.is_empty() {
            return Ok(ReconcileReport::default());
        }

        let mut by_day: BTreeMap<NaiveDate, Vec<&PredictionRecord>> = BTreeMap::new();
        for record in &due {
            by_day.entry(record.date).or_default().push(record);
        }

        let mut grades = Vec::new();
        for (date, records) in by_day {
            let results = match self.registry.resolve_results(league, date).await {
                Ok(resolution) => resolution.matches,
                Err(e) => {
                    debug!("⏳ No results yet for {} on {}: {}", league, date, e);
                    continue;
                }
            };
            let finals = FinalResults::new(&results);

            for record in records {
                if let Some((outcome, score)) = finals.lookup(record) {
                    grades.push(Grade {
                        date,
                        match_id: record.match_id.clone(),
                        outcome,
                        final_score: score,
                        graded_at: now,
                    });
                }
            }
        }

        let applied = self.ledger.apply_grades(league, &grades).await?;
        if let Some(metrics) = &self.metrics {
            metrics.record_grades(&applied);
        }

        Ok(ReconcileReport {
            examined: due.len(),
            graded: applied.graded,
            correct: applied.correct,
            still_pending: due.len().saturating_sub(applied.graded),
        })
    }

    pub async fn accuracy(&self) -> Result<AccuracyReport> {
        let (overall, leagues) = self.ledger.accuracy_report().await?;
        Ok(AccuracyReport { overall, leagues })
    }
}

/// Finished fixtures indexed by provider id and by matchup label. The label fallback
/// covers results served by a different provider than the one that produced the pick.
struct FinalResults {
    by_id: HashMap<String, (Side, Score)>,
    by_label: HashMap<String, (Side, Score)>,
}

impl FinalResults {
    fn new(results: &[tipster_models::Match]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_label = HashMap::new();
        for fixture in results {
            if let Some(outcome) = fixture.final_outcome() {
                by_id.insert(fixture.id.clone(), outcome);
                by_label.insert(fixture.matchup_label().to_lowercase(), outcome);
            }
        }
        Self { by_id, by_label }
    }

    fn lookup(&self, record: &PredictionRecord) -> Option<(Side, Score)> {
        self.by_id
            .get(&record.match_id)
            .or_else(|| self.by_label.get(&record.matchup_label.to_lowercase()))
            .copied()
    }
}
