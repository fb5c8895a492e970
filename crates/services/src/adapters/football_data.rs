use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tipster_models::{LeagueConfig, MarketOdds, Match, MatchStatus, Result, Score, TipsterError};
use tracing::debug;
use super::http::{fetch_json, parse_timestamp};
use super::SourceAdapter;

pub const PROVIDER: &str = "football-data";
pub const DEFAULT_BASE_URL: &str = "https://api.football-data.org/v4";

/// Specialized soccer provider. Needs an API key; without one every call is
/// `ProviderUnavailable` so the chain falls through.
pub struct FootballDataAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    horizon_days: i64,
}

impl FootballDataAdapter {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            horizon_days: 7,
        }
    }

    pub fn with_horizon_days(mut self, days: i64) -> Self {
        self.horizon_days = days.max(0);
        self
    }

    async fn matches(&self, league: &LeagueConfig, from: NaiveDate, to: NaiveDate) -> Result<Vec<Match>> {
        let code = league
            .providers
            .football_data
            .as_deref()
            .ok_or_else(|| TipsterError::unavailable(PROVIDER, format!("no competition code for {}", league.id)))?;
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TipsterError::unavailable(PROVIDER, "no API key configured"))?;

        let url = format!("{}/competitions/{}/matches", self.base_url.trim_end_matches('/'), code);
        let request = self
            .client
            .get(url)
            .header("X-Auth-Token", key)
            .query(&[("dateFrom", from.to_string()), ("dateTo", to.to_string())]);

        let body: MatchesResponse = fetch_json(PROVIDER, request).await?;
        let matches = convert(body, &league.id);
        debug!("⚽ {} returned {} fixtures for {}", PROVIDER, matches.len(), league.id);
        Ok(matches)
    }
}

#[async_trait]
impl SourceAdapter for FootballDataAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, league: &LeagueConfig) -> bool {
        league.providers.football_data.is_some()
    }

    async fn fetch(&self, league: &LeagueConfig) -> Result<Vec<Match>> {
        let today = Utc::now().date_naive();
        self.matches(league, today, today + Duration::days(self.horizon_days)).await
    }

    async fn fetch_results(&self, league: &LeagueConfig, date: NaiveDate) -> Result<Vec<Match>> {
        self.matches(league, date, date).await
    }
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<FdMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdMatch {
    id: u64,
    utc_date: String,
    status: String,
    #[serde(default)]
    venue: Option<String>,
    home_team: FdTeam,
    away_team: FdTeam,
    #[serde(default)]
    score: Option<FdScore>,
    #[serde(default)]
    odds: Option<FdOdds>,
}

#[derive(Debug, Deserialize)]
struct FdTeam {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdScore {
    #[serde(default)]
    full_time: Option<FdGoals>,
}

#[derive(Debug, Deserialize)]
struct FdGoals {
    home: Option<u16>,
    away: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdOdds {
    home_win: Option<f64>,
    draw: Option<f64>,
    away_win: Option<f64>,
}

fn status_from(raw: &str) -> MatchStatus {
    match raw {
        "IN_PLAY" | "PAUSED" | "LIVE" => MatchStatus::Live,
        "FINISHED" | "AWARDED" => MatchStatus::Finished,
        "POSTPONED" | "SUSPENDED" => MatchStatus::Postponed,
        "CANCELLED" => MatchStatus::Cancelled,
        _ => MatchStatus::Scheduled,
    }
}

/// Fixtures without both team names (unresolved cup draws) are skipped.
fn convert(body: MatchesResponse, league_id: &str) -> Vec<Match> {
    body.matches
        .into_iter()
        .filter_map(|m| {
            let home = m.home_team.name?;
            let away = m.away_team.name?;
            let kickoff = parse_timestamp(&m.utc_date)?;

            let mut fixture = Match::new(m.id.to_string(), league_id, home, away, kickoff)
                .with_status(status_from(&m.status));
            if let Some(venue) = m.venue.filter(|v| !v.is_empty()) {
                fixture = fixture.with_venue(venue);
            }
            if let Some(FdGoals { home: Some(h), away: Some(a) }) = m.score.and_then(|s| s.full_time) {
                fixture = fixture.with_score(Score::new(h, a));
            }
            if let Some(odds) = m.odds.and_then(market_odds) {
                fixture = fixture.with_odds(odds);
            }
            Some(fixture)
        })
        .collect()
}

fn market_odds(odds: FdOdds) -> Option<MarketOdds> {
    let home = Decimal::from_f64_retain(odds.home_win?)?;
    let away = Decimal::from_f64_retain(odds.away_win?)?;
    let draw = odds.draw.and_then(Decimal::from_f64_retain);
    MarketOdds::new(PROVIDER, home, draw, away).ok()
}
