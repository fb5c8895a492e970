use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tipster_models::{LeagueConfig, MarketOdds, Match, MatchStatus, Result, Score, TeamRecord, TipsterError};
use tracing::debug;
use super::http::{fetch_json, json_u16, parse_timestamp};
use super::SourceAdapter;

pub const PROVIDER: &str = "espn";
pub const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Generic scoreboard provider covering every sport. Carries moneylines and season
/// records when ESPN publishes them.
pub struct EspnAdapter {
    client: Client,
    base_url: String,
}

impl EspnAdapter {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn scoreboard(&self, league: &LeagueConfig, date: Option<NaiveDate>) -> Result<Vec<Match>> {
        let path = league
            .providers
            .espn
            .as_deref()
            .ok_or_else(|| TipsterError::unavailable(PROVIDER, format!("no scoreboard path for {}", league.id)))?;

        let url = format!("{}/{}/scoreboard", self.base_url.trim_end_matches('/'), path.trim_matches('/'));
        let mut request = self.client.get(url);
        if let Some(date) = date {
            request = request.query(&[("dates", date.format("%Y%m%d").to_string())]);
        }

        let body: Scoreboard = fetch_json(PROVIDER, request).await?;
        let matches = convert(body, &league.id);
        debug!("📺 {} returned {} events for {}", PROVIDER, matches.len(), league.id);
        Ok(matches)
    }
}

#[async_trait]
impl SourceAdapter for EspnAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, league: &LeagueConfig) -> bool {
        league.providers.espn.is_some()
    }

    async fn fetch(&self, league: &LeagueConfig) -> Result<Vec<Match>> {
        self.scoreboard(league, None).await
    }

    async fn fetch_results(&self, league: &LeagueConfig, date: NaiveDate) -> Result<Vec<Match>> {
        self.scoreboard(league, Some(date)).await
    }
}

#[derive(Debug, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    id: String,
    date: String,
    #[serde(default)]
    competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
struct Competition {
    #[serde(default)]
    competitors: Vec<Competitor>,
    #[serde(default)]
    venue: Option<Venue>,
    #[serde(default)]
    status: Option<Status>,
    #[serde(default)]
    odds: Vec<Odds>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Competitor {
    #[serde(default)]
    home_away: String,
    #[serde(default)]
    team: Option<Team>,
    #[serde(default)]
    score: Option<serde_json::Value>,
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Team {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    summary: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Venue {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "type", default)]
    kind: Option<StatusType>,
}

#[derive(Debug, Deserialize)]
struct StatusType {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Odds {
    #[serde(default)]
    provider: Option<OddsProvider>,
    #[serde(default)]
    home_team_odds: Option<SideOdds>,
    #[serde(default)]
    away_team_odds: Option<SideOdds>,
    #[serde(default)]
    draw_odds: Option<SideOdds>,
}

#[derive(Debug, Deserialize)]
struct OddsProvider {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SideOdds {
    #[serde(default)]
    money_line: Option<f64>,
}

fn status_from(status: Option<&StatusType>) -> MatchStatus {
    let Some(status) = status else {
        return MatchStatus::Scheduled;
    };

    match status.name.as_deref() {
        Some("STATUS_POSTPONED") => return MatchStatus::Postponed,
        Some("STATUS_CANCELED" | "STATUS_CANCELLED" | "STATUS_ABANDONED") => return MatchStatus::Cancelled,
        _ => {}
    }

    match (status.state.as_deref(), status.completed.unwrap_or(false)) {
        (_, true) => MatchStatus::Finished,
        (Some("in"), _) => MatchStatus::Live,
        (Some("post"), _) => MatchStatus::Finished,
        _ => MatchStatus::Scheduled,
    }
}

fn team_name(competitor: &Competitor) -> Option<String> {
    let team = competitor.team.as_ref()?;
    team.display_name
        .clone()
        .or_else(|| team.name.clone())
        .filter(|n| !n.is_empty())
}

/// Overall season record: the `total` entry if tagged, else the first one.
fn season_record(competitor: &Competitor) -> Option<TeamRecord> {
    competitor
        .records
        .iter()
        .find(|r| r.kind.as_deref() == Some("total"))
        .or_else(|| competitor.records.first())
        .and_then(|r| r.summary.as_deref())
        .and_then(TeamRecord::parse)
}

fn market_odds(odds: &Odds) -> Option<MarketOdds> {
    let moneyline = |side: &Option<SideOdds>| side.as_ref().and_then(|s| s.money_line).map(|v| v.round() as i32);
    let provider = odds
        .provider
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| PROVIDER.to_string());

    MarketOdds::from_american(
        provider,
        moneyline(&odds.home_team_odds)?,
        moneyline(&odds.draw_odds),
        moneyline(&odds.away_team_odds)?,
    )
    .ok()
}

fn convert(body: Scoreboard, league_id: &str) -> Vec<Match> {
    body.events
        .into_iter()
        .filter_map(|event| {
            let competition = event.competitions.into_iter().next()?;
            let home = competition.competitors.iter().find(|c| c.home_away == "home")?;
            let away = competition.competitors.iter().find(|c| c.home_away == "away")?;
            let kickoff = parse_timestamp(&event.date)?;

            let status = status_from(competition.status.as_ref().and_then(|s| s.kind.as_ref()));
            let mut fixture = Match::new(event.id, league_id, team_name(home)?, team_name(away)?, kickoff)
                .with_status(status);

            if let Some(venue) = competition.venue.as_ref().and_then(|v| v.full_name.clone()) {
                fixture = fixture.with_venue(venue);
            }
            if matches!(status, MatchStatus::Live | MatchStatus::Finished) {
                let h = home.score.as_ref().and_then(json_u16);
                let a = away.score.as_ref().and_then(json_u16);
                if let (Some(h), Some(a)) = (h, a) {
                    fixture = fixture.with_score(Score::new(h, a));
                }
            }
            if let (Some(h), Some(a)) = (season_record(home), season_record(away)) {
                fixture = fixture.with_records(h, a);
            }
            if let Some(odds) = competition.odds.iter().find_map(market_odds) {
                fixture = fixture.with_odds(odds);
            }
            Some(fixture)
        })
        .collect()
}
