use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tipster_models::{LeagueConfig, Match, Result, TipsterError};
use tracing::{debug, info, warn};
use crate::adapters::SourceAdapter;
use crate::metrics::PipelineMetrics;

/// Which provider answered, and how every earlier candidate fared.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub league: LeagueConfig,
    pub provider: String,
    pub matches: Vec<Match>,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Matches(usize),
    Empty,
    Failed(String),
    TimedOut,
}

impl AttemptOutcome {
    fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Matches(_) => "matches",
            AttemptOutcome::Empty => "empty",
            AttemptOutcome::Failed(_) => "failed",
            AttemptOutcome::TimedOut => "timeout",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Query {
    Upcoming,
    Results(NaiveDate),
}

struct LeagueEntry {
    config: LeagueConfig,
    candidates: Vec<Arc<dyn SourceAdapter>>,
}

/// Metric label shared by every unregistered league id, so client input cannot mint
/// new series.
pub(crate) const UNKNOWN_LEAGUE_LABEL: &str = "_unknown";

/// League ids are matched case-insensitively, ignoring surrounding whitespace.
pub fn normalize_league_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Maps each league to an ordered list of adapters and walks it until one returns data.
pub struct ResolutionRegistry {
    leagues: HashMap<String, LeagueEntry>,
    order: Vec<String>,
    attempt_timeout: Duration,
    metrics: Option<Arc<PipelineMetrics>>,
}

pub struct RegistryBuilder {
    entries: Vec<LeagueEntry>,
    attempt_timeout: Duration,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            attempt_timeout: Duration::from_secs(10),
            metrics: None,
        }
    }
}

impl RegistryBuilder {
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Registers a league with an explicit candidate order. Re-registering an id
    /// replaces the earlier entry.
    pub fn league(mut self, mut config: LeagueConfig, candidates: Vec<Arc<dyn SourceAdapter>>) -> Self {
        config.id = normalize_league_id(&config.id);
        self.entries.retain(|e| e.config.id != config.id);
        self.entries.push(LeagueEntry { config, candidates });
        self
    }

    pub fn build(self) -> ResolutionRegistry {
        let order = self.entries.iter().map(|e| e.config.id.clone()).collect();
        let leagues = self
            .entries
            .into_iter()
            .map(|e| (e.config.id.clone(), e))
            .collect();

        ResolutionRegistry {
            leagues,
            order,
            attempt_timeout: self.attempt_timeout,
            metrics: self.metrics,
        }
    }
}

impl ResolutionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Every league in `catalog` gets the adapters from `chain` that support it, in
    /// chain order (specialized, then legacy, then generic).
    pub fn standard(
        catalog: Vec<LeagueConfig>,
        chain: Vec<Arc<dyn SourceAdapter>>,
        attempt_timeout: Duration,
        metrics: Option<Arc<PipelineMetrics>>,
    ) -> Self {
        let mut builder = Self::builder().attempt_timeout(attempt_timeout);
        if let Some(metrics) = metrics {
            builder = builder.metrics(metrics);
        }

        for league in catalog {
            let candidates: Vec<Arc<dyn SourceAdapter>> =
                chain.iter().filter(|a| a.supports(&league)).cloned().collect();
            if candidates.is_empty() {
                warn!("⚠️ League {} has no supporting provider", league.id);
            }
            builder = builder.league(league, candidates);
        }
        builder.build()
    }

    pub fn league(&self, id: &str) -> Option<&LeagueConfig> {
        self.leagues.get(&normalize_league_id(id)).map(|e| &e.config)
    }

    /// Registered leagues in registration order.
    pub fn leagues(&self) -> Vec<&LeagueConfig> {
        self.order
            .iter()
            .filter_map(|id| self.leagues.get(id))
            .map(|e| &e.config)
            .collect()
    }

    pub fn candidates(&self, id: &str) -> Vec<String> {
        self.leagues
            .get(&normalize_league_id(id))
            .map(|e| e.candidates.iter().map(|a| a.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Upcoming fixtures from the first candidate that returns any.
    pub async fn resolve(&self, league_id: &str) -> Result<Resolution> {
        self.run_chain(league_id, Query::Upcoming).await
    }

    /// Fixtures played on `date`, walked through the same chain.
    pub async fn resolve_results(&self, league_id: &str, date: NaiveDate) -> Result<Resolution> {
        self.run_chain(league_id, Query::Results(date)).await
    }

    async fn run_chain(&self, league_id: &str, query: Query) -> Result<Resolution> {
        let id = normalize_league_id(league_id);
        let Some(entry) = self.leagues.get(&id) else {
            debug!("🔍 Unknown league {}", id);
            self.record_resolution(UNKNOWN_LEAGUE_LABEL, "unknown");
            return Err(TipsterError::NoDataForLeague { league: id });
        };

        let mut attempts = Vec::with_capacity(entry.candidates.len());
        for adapter in &entry.candidates {
            let outcome = match self.attempt(adapter.as_ref(), &entry.config, query).await {
                None => {
                    warn!("⏱️ {} timed out for {} after {:?}", adapter.name(), id, self.attempt_timeout);
                    AttemptOutcome::TimedOut
                }
                Some(Ok(matches)) if !matches.is_empty() => {
                    let count = matches.len();
                    self.record_attempt(adapter.name(), &AttemptOutcome::Matches(count));
                    attempts.push(Attempt {
                        provider: adapter.name().to_string(),
                        outcome: AttemptOutcome::Matches(count),
                    });
                    info!("✅ Resolved {} via {} ({} matches)", id, adapter.name(), count);
                    self.record_resolution(&id, "resolved");
                    return Ok(Resolution {
                        league: entry.config.clone(),
                        provider: adapter.name().to_string(),
                        matches,
                        attempts,
                    });
                }
                Some(Ok(_)) => AttemptOutcome::Empty,
                Some(Err(e)) => {
                    warn!("⚠️ {} failed for {}: {}", adapter.name(), id, e);
                    AttemptOutcome::Failed(e.to_string())
                }
            };

            debug!("↪️ {} gave {:?} for {}, trying next provider", adapter.name(), outcome, id);
            self.record_attempt(adapter.name(), &outcome);
            attempts.push(Attempt {
                provider: adapter.name().to_string(),
                outcome,
            });
        }

        info!("📭 No provider had data for {} after {} attempts", id, attempts.len());
        self.record_resolution(&id, "no_data");
        Err(TipsterError::NoDataForLeague { league: id })
    }

    /// `None` when the attempt ran past `attempt_timeout`.
    async fn attempt(
        &self,
        adapter: &dyn SourceAdapter,
        league: &LeagueConfig,
        query: Query,
    ) -> Option<Result<Vec<Match>>> {
        let call = async {
            match query {
                Query::Upcoming => adapter.fetch(league).await,
                Query::Results(date) => adapter.fetch_results(league, date).await,
            }
        };

        tokio::time::timeout(self.attempt_timeout, call).await.ok()
    }

    fn record_resolution(&self, league: &str, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_resolution(league, outcome);
        }
    }

    fn record_attempt(&self, provider: &str, outcome: &AttemptOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt(provider, outcome.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockSourceAdapter;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::always;
    use tipster_models::Sport;

    fn league() -> LeagueConfig {
        LeagueConfig::new("epl", "Premier League", Sport::Soccer)
    }

    fn fixtures(n: usize) -> Vec<Match> {
        (0..n)
            .map(|i| {
                Match::new(
                    format!("m{i}"),
                    "epl",
                    format!("Home {i}"),
                    format!("Away {i}"),
                    Utc.with_ymd_and_hms(2024, 8, 17, 15, 0, 0).unwrap(),
                )
            })
            .collect()
    }

    /// Sleeps well past any test attempt timeout before answering.
    struct StalledAdapter;

    #[async_trait::async_trait]
    impl SourceAdapter for StalledAdapter {
        fn name(&self) -> &str {
            "stalled"
        }

        fn supports(&self, _league: &LeagueConfig) -> bool {
            true
        }

        async fn fetch(&self, _league: &LeagueConfig) -> Result<Vec<Match>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(fixtures(5))
        }

        async fn fetch_results(&self, _league: &LeagueConfig, _date: NaiveDate) -> Result<Vec<Match>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(fixtures(5))
        }
    }

    fn adapter(name: &'static str) -> MockSourceAdapter {
        let mut mock = MockSourceAdapter::new();
        mock.expect_name().return_const(name.to_string());
        mock
    }

    #[tokio::test]
    async fn test_first_non_empty_candidate_wins() {
        let mut a = adapter("a");
        a.expect_fetch()
            .times(1)
            .returning(|_| Err(TipsterError::unavailable("a", "connection refused")));
        let mut b = adapter("b");
        b.expect_fetch().times(1).returning(|_| Ok(fixtures(3)));
        let mut c = adapter("c");
        c.expect_fetch().times(0);

        let registry = ResolutionRegistry::builder()
            .league(league(), vec![Arc::new(a), Arc::new(b), Arc::new(c)])
            .build();

        let resolution = registry.resolve("EPL").await.unwrap();
        assert_eq!(resolution.provider, "b");
        assert_eq!(resolution.matches.len(), 3);
        assert_eq!(resolution.attempts.len(), 2);
        assert!(matches!(resolution.attempts[0].outcome, AttemptOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_everywhere_is_no_data() {
        let mut a = adapter("a");
        a.expect_fetch().times(1).returning(|_| Ok(Vec::new()));
        let mut b = adapter("b");
        b.expect_fetch()
            .times(1)
            .returning(|_| Err(TipsterError::malformed("b", "unexpected token")));

        let registry = ResolutionRegistry::builder()
            .league(league(), vec![Arc::new(a), Arc::new(b)])
            .build();

        let err = registry.resolve("epl").await.unwrap_err();
        assert!(matches!(err, TipsterError::NoDataForLeague { league } if league == "epl"));
    }

    #[tokio::test]
    async fn test_unknown_league_makes_no_calls() {
        let mut a = adapter("a");
        a.expect_fetch().times(0);
        let registry = ResolutionRegistry::builder()
            .league(league(), vec![Arc::new(a)])
            .build();

        assert!(matches!(
            registry.resolve("klingon-premier").await,
            Err(TipsterError::NoDataForLeague { .. })
        ));
    }

    #[tokio::test]
    async fn test_results_use_the_same_chain() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 17).unwrap();
        let mut a = adapter("a");
        a.expect_fetch_results()
            .with(always(), mockall::predicate::eq(date))
            .times(1)
            .returning(|_, _| Ok(fixtures(1)));

        let registry = ResolutionRegistry::builder()
            .league(league(), vec![Arc::new(a)])
            .build();

        let resolution = registry.resolve_results("epl", date).await.unwrap();
        assert_eq!(resolution.provider, "a");
    }

    #[tokio::test]
    async fn test_standard_filters_by_support() {
        let mut specialized = adapter("specialized");
        specialized
            .expect_supports()
            .returning(|l: &LeagueConfig| l.sport == Sport::Soccer);
        let mut generic = adapter("generic");
        generic.expect_supports().return_const(true);

        let catalog = vec![league(), LeagueConfig::new("nba", "NBA", Sport::Basketball)];
        let registry = ResolutionRegistry::standard(
            catalog,
            vec![Arc::new(specialized), Arc::new(generic)],
            Duration::from_secs(1),
            None,
        );

        assert_eq!(registry.candidates("epl"), vec!["specialized", "generic"]);
        assert_eq!(registry.candidates("nba"), vec!["generic"]);
        assert_eq!(registry.leagues().len(), 2);
    }

    #[tokio::test]
    async fn test_timed_out_candidate_falls_through() {
        let mut backup = adapter("backup");
        backup.expect_fetch().times(1).returning(|_| Ok(fixtures(2)));

        let registry = ResolutionRegistry::builder()
            .league(league(), vec![Arc::new(StalledAdapter), Arc::new(backup)])
            .attempt_timeout(Duration::from_millis(50))
            .build();

        let started = std::time::Instant::now();
        let resolution = registry.resolve("epl").await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(resolution.provider, "backup");
        assert_eq!(resolution.matches.len(), 2);
        assert_eq!(
            resolution.attempts,
            vec![
                Attempt {
                    provider: "stalled".to_string(),
                    outcome: AttemptOutcome::TimedOut,
                },
                Attempt {
                    provider: "backup".to_string(),
                    outcome: AttemptOutcome::Matches(2),
                },
            ]
        );
    }
}
