use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tipster_db::LedgerRepository;
use tipster_ml::ConsensusEngine;
use tipster_models::{LeagueConfig, PredictionRecord, Result, ScoredMatch, TipsterError, WorkerRecord};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use crate::cache::{MatchCache, MatchSnapshot};
use crate::metrics::PipelineMetrics;
use crate::reconciler::ResultReconciler;
use crate::registry::{normalize_league_id, Attempt, ResolutionRegistry, UNKNOWN_LEAGUE_LABEL};
use crate::workers::WorkerRegistry;

#[derive(Debug, Clone)]
pub struct SelectionSettings {
    pub cache_ttl: Duration,
    /// Spawn a reconciliation pass for the league after each successful selection.
    pub reconcile_on_select: bool,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::minutes(5),
            reconcile_on_select: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub league: String,
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
    pub matches: Vec<ScoredMatch>,
    pub worker: Option<WorkerRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<Attempt>,
}

impl Selection {
    fn from_snapshot(snapshot: MatchSnapshot, worker: Option<WorkerRecord>) -> Self {
        Self {
            league: snapshot.league,
            provider: snapshot.provider,
            fetched_at: snapshot.fetched_at,
            from_cache: true,
            matches: snapshot.matches,
            worker,
            attempts: Vec::new(),
        }
    }
}

/// Resolve → score → cache → ledger → worker, for one league at a time.
///
/// Selections of the same league are serialized around the write section, and a
/// selection that was overtaken by a newer one (or by `kill_all`) is discarded instead
/// of written.
pub struct SelectionService {
    registry: Arc<ResolutionRegistry>,
    engine: Arc<ConsensusEngine>,
    ledger: Arc<LedgerRepository>,
    reconciler: Option<Arc<ResultReconciler>>,
    metrics: Arc<PipelineMetrics>,
    settings: SelectionSettings,
    cache: MatchCache,
    workers: WorkerRegistry,
    generations: DashMap<String, Arc<AtomicU64>>,
    league_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SelectionService {
    pub fn new(
        registry: Arc<ResolutionRegistry>,
        engine: Arc<ConsensusEngine>,
        ledger: Arc<LedgerRepository>,
        metrics: Arc<PipelineMetrics>,
        settings: SelectionSettings,
    ) -> Self {
        Self {
            registry,
            engine,
            ledger,
            reconciler: None,
            metrics,
            settings,
            cache: MatchCache::new(),
            workers: WorkerRegistry::new(),
            generations: DashMap::new(),
            league_locks: DashMap::new(),
        }
    }

    pub fn with_reconciler(mut self, reconciler: Arc<ResultReconciler>) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    fn generation_counter(&self, league: &str) -> Arc<AtomicU64> {
        self.generations
            .entry(league.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    }

    fn begin_generation(&self, league: &str) -> u64 {
        self.generation_counter(league).fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, league: &str, generation: u64) -> bool {
        self.generation_counter(league).load(Ordering::SeqCst) == generation
    }

    fn league_lock(&self, league: &str) -> Arc<Mutex<()>> {
        self.league_locks
            .entry(league.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Full refresh of one league. `NoDataForLeague` leaves no worker behind and no
    /// snapshot for that league.
    pub async fn select(&self, league_id: &str) -> Result<Selection> {
        let league = normalize_league_id(league_id);
        if self.registry.league(&league).is_none() {
            // Unregistered ids never get per-league state.
            debug!("🔍 Unknown league {}", league);
            self.metrics.record_resolution(UNKNOWN_LEAGUE_LABEL, "unknown");
            return Err(TipsterError::NoDataForLeague { league });
        }

        let _timer = self.metrics.selection_timer();
        let generation = self.begin_generation(&league);
        info!("🎯 Selecting {} (generation {})", league, generation);

        let resolution = match self.registry.resolve(&league).await {
            Ok(resolution) => resolution,
            Err(e) => {
                if matches!(e, TipsterError::NoDataForLeague { .. })
                    && self.is_current(&league, generation)
                    && self.cache.invalidate(&league)
                {
                    info!("🧹 Dropped cached matches for {}", league);
                }
                return Err(e);
            }
        };

        let sport = resolution.league.sport;
        let scored: Vec<ScoredMatch> = resolution
            .matches
            .iter()
            .map(|fixture| self.engine.score(fixture, sport))
            .collect();
        let fetched_at = Utc::now();

        let lock = self.league_lock(&league);
        let guard = lock.lock().await;

        if !self.is_current(&league, generation) {
            return Err(self.superseded(league, generation));
        }

        let records: Vec<PredictionRecord> = scored
            .iter()
            .map(|s| PredictionRecord::from_scored(s, fetched_at))
            .collect();
        match self.ledger.merge_all(&league, records).await {
            Ok(report) => self.metrics.record_merge(&report),
            Err(e) => error!("❌ Ledger merge failed for {}: {}", league, e),
        }

        // `kill_all` may have run during the merge; it waits on this lock before
        // clearing, so nothing below can outlive it.
        if !self.is_current(&league, generation) {
            return Err(self.superseded(league, generation));
        }

        self.cache.replace(MatchSnapshot {
            league: league.clone(),
            provider: resolution.provider.clone(),
            fetched_at,
            matches: scored.clone(),
        });
        let (worker, created) = self.workers.activate(&league, scored.len(), fetched_at);
        if created {
            self.metrics.record_worker_spawned();
        }
        drop(guard);

        self.spawn_reconcile(&league);

        Ok(Selection {
            league,
            provider: resolution.provider,
            fetched_at,
            from_cache: false,
            matches: scored,
            worker: Some(worker),
            attempts: resolution.attempts,
        })
    }

    fn superseded(&self, league: String, generation: u64) -> TipsterError {
        warn!("⏭️ Discarding superseded selection of {} (generation {})", league, generation);
        self.metrics.record_resolution(&league, "superseded");
        TipsterError::SelectionSuperseded { league }
    }

    fn spawn_reconcile(&self, league: &str) {
        if !self.settings.reconcile_on_select {
            return;
        }
        let Some(reconciler) = self.reconciler.clone() else {
            return;
        };

        let league = league.to_string();
        tokio::spawn(async move {
            match reconciler.run_for_league(&league, Utc::now()).await {
                Ok(report) if report.graded > 0 => {
                    info!("📊 Reconciled {} after selection: {} graded", league, report.graded)
                }
                Ok(_) => {}
                Err(e) => warn!("⚠️ Post-selection reconciliation failed for {}: {}", league, e),
            }
        });
    }

    /// Serves the cached snapshot if it is for this league and still fresh, else selects.
    pub async fn matches_for(&self, league_id: &str) -> Result<Selection> {
        let league = normalize_league_id(league_id);
        if let Some(snapshot) = self.cache.fresh(&league, Utc::now(), self.settings.cache_ttl) {
            debug!("📦 Serving {} from cache", league);
            return Ok(Selection::from_snapshot(snapshot, self.workers.get(&league)));
        }
        self.select(&league).await
    }

    /// Selects several leagues concurrently. Results come back in input order.
    pub async fn select_many(self: &Arc<Self>, league_ids: &[String]) -> Vec<(String, Result<Selection>)> {
        let mut tasks = JoinSet::new();
        for (index, league) in league_ids.iter().enumerate() {
            let service = Arc::clone(self);
            let league = league.clone();
            tasks.spawn(async move {
                let result = service.select(&league).await;
                (index, league, result)
            });
        }

        let mut results = Vec::with_capacity(league_ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => error!("❌ Selection task panicked: {}", e),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);
        results.into_iter().map(|(_, league, result)| (league, result)).collect()
    }

    pub fn workers(&self) -> Vec<WorkerRecord> {
        self.workers.list()
    }

    /// Clears workers and the cache, and invalidates every in-flight selection.
    ///
    /// Waits for any selection already inside its write section, so that selection sees
    /// the bumped generation and writes no worker or snapshot after the clear.
    pub async fn kill_all(&self) -> usize {
        for counter in self.generations.iter() {
            counter.value().fetch_add(1, Ordering::SeqCst);
        }

        let mut locks: Vec<(String, Arc<Mutex<()>>)> = self
            .league_locks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        locks.sort_by(|a, b| a.0.cmp(&b.0));
        let mut guards = Vec::with_capacity(locks.len());
        for (_, lock) in &locks {
            guards.push(lock.lock().await);
        }

        self.cache.clear();
        self.workers.kill_all()
    }

    pub fn leagues(&self) -> Vec<LeagueConfig> {
        self.registry.leagues().into_iter().cloned().collect()
    }

    pub fn current_snapshot(&self) -> Option<MatchSnapshot> {
        self.cache.current()
    }

    pub fn ledger(&self) -> &Arc<LedgerRepository> {
        &self.ledger
    }
}
