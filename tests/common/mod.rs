// Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tipster_api::AppState;
use tipster_db::{JsonFileLedgerStore, LedgerRepository};
use tipster_ml::{ConsensusConfig, ConsensusEngine};
use tipster_models::{LeagueConfig, Match, MatchStatus, Result, Score, Sport, TipsterError};
use tipster_services::{
    PipelineMetrics, ResolutionRegistry, ResultReconciler, SelectionService, SelectionSettings, SourceAdapter,
};

/// Scripted provider: each `fetch` pops the next scripted response, falling back to the
/// default fixtures once the script runs out.
pub struct FakeAdapter {
    name: String,
    script: Mutex<VecDeque<(Duration, Vec<Match>)>>,
    default: Mutex<Vec<Match>>,
    results: Mutex<HashMap<NaiveDate, Vec<Match>>>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn new(name: &str, fixtures: Vec<Match>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(fixtures),
            results: Mutex::new(HashMap::new()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn then(self, delay: Duration, fixtures: Vec<Match>) -> Self {
        self.script.lock().unwrap().push_back((delay, fixtures));
        self
    }

    pub fn set_default(&self, fixtures: Vec<Match>) {
        *self.default.lock().unwrap() = fixtures;
    }

    pub fn set_results(&self, date: NaiveDate, fixtures: Vec<Match>) {
        self.results.lock().unwrap().insert(date, fixtures);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, _league: &LeagueConfig) -> bool {
        true
    }

    async fn fetch(&self, _league: &LeagueConfig) -> Result<Vec<Match>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TipsterError::unavailable(&self.name, "connection refused"));
        }

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some((delay, fixtures)) => {
                tokio::time::sleep(delay).await;
                Ok(fixtures)
            }
            None => Ok(self.default.lock().unwrap().clone()),
        }
    }

    async fn fetch_results(&self, _league: &LeagueConfig, date: NaiveDate) -> Result<Vec<Match>> {
        if self.fail {
            return Err(TipsterError::unavailable(&self.name, "connection refused"));
        }
        Ok(self.results.lock().unwrap().get(&date).cloned().unwrap_or_default())
    }
}

pub fn kickoff(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, day, hour, 0, 0).unwrap()
}

pub fn fixture(id: &str, home: &str, away: &str, at: DateTime<Utc>) -> Match {
    Match::new(id, "nba", home, away, at)
}

pub fn finished(id: &str, home: &str, away: &str, at: DateTime<Utc>, score: (u16, u16)) -> Match {
    fixture(id, home, away, at)
        .with_status(MatchStatus::Finished)
        .with_score(Score::new(score.0, score.1))
}

pub struct TestHarness {
    pub state: AppState,
    pub selection: Arc<SelectionService>,
    pub reconciler: Arc<ResultReconciler>,
    pub ledger: Arc<LedgerRepository>,
    pub ledger_dir: TempDir,
}

/// One basketball league (`nba`) served by `adapters` in order, with a JSON ledger in a
/// temp directory and no background reconciliation.
pub fn harness(adapters: Vec<Arc<dyn SourceAdapter>>) -> TestHarness {
    let metrics = Arc::new(PipelineMetrics::new().unwrap());
    let registry = Arc::new(
        ResolutionRegistry::builder()
            .league(LeagueConfig::new("nba", "NBA", Sport::Basketball), adapters)
            .attempt_timeout(Duration::from_secs(5))
            .metrics(metrics.clone())
            .build(),
    );

    let ledger_dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(LedgerRepository::new(Arc::new(JsonFileLedgerStore::new(
        ledger_dir.path(),
    ))));
    let reconciler = Arc::new(
        ResultReconciler::new(registry.clone(), ledger.clone(), chrono::Duration::hours(3))
            .with_metrics(metrics.clone()),
    );
    let selection = Arc::new(
        SelectionService::new(
            registry,
            Arc::new(ConsensusEngine::new(ConsensusConfig::default()).unwrap()),
            ledger.clone(),
            metrics.clone(),
            SelectionSettings {
                cache_ttl: chrono::Duration::minutes(5),
                reconcile_on_select: false,
            },
        )
        .with_reconciler(reconciler.clone()),
    );

    let state = AppState::new(selection.clone(), reconciler.clone(), ledger.clone(), metrics);
    TestHarness {
        state,
        selection,
        reconciler,
        ledger,
        ledger_dir,
    }
}
