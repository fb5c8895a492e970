use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tipster_models::{LeagueConfig, Match, MatchStatus, Result, Score, TipsterError};
use tracing::debug;
use super::http::{fetch_json, json_u16, parse_date_time, parse_timestamp};
use super::SourceAdapter;

pub const PROVIDER: &str = "thesportsdb";
pub const DEFAULT_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json";
pub const PUBLIC_KEY: &str = "3";

/// Legacy multi-sport provider. No odds, no records.
pub struct TheSportsDbAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TheSportsDbAdapter {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn events(&self, league: &LeagueConfig, endpoint: &str) -> Result<Vec<Match>> {
        let league_key = league
            .providers
            .thesportsdb
            .as_deref()
            .ok_or_else(|| TipsterError::unavailable(PROVIDER, format!("no league id for {}", league.id)))?;

        let url = format!("{}/{}/{}", self.base_url.trim_end_matches('/'), self.api_key, endpoint);
        let request = self.client.get(url).query(&[("id", league_key)]);

        let body: EventsResponse = fetch_json(PROVIDER, request).await?;
        let matches = convert(body, &league.id);
        debug!("🏟️ {} returned {} events for {}", PROVIDER, matches.len(), league.id);
        Ok(matches)
    }
}

#[async_trait]
impl SourceAdapter for TheSportsDbAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports(&self, league: &LeagueConfig) -> bool {
        league.providers.thesportsdb.is_some()
    }

    async fn fetch(&self, league: &LeagueConfig) -> Result<Vec<Match>> {
        self.events(league, "eventsnextleague.php").await
    }

    async fn fetch_results(&self, league: &LeagueConfig, date: NaiveDate) -> Result<Vec<Match>> {
        let mut past = self.events(league, "eventspastleague.php").await?;
        past.retain(|m| m.match_day() == date);
        Ok(past)
    }
}

/// `events` is `null`, not `[]`, when the league has nothing scheduled.
#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Option<Vec<TsdbEvent>>,
}

#[derive(Debug, Deserialize)]
struct TsdbEvent {
    #[serde(rename = "idEvent")]
    id: String,
    #[serde(rename = "strHomeTeam", default)]
    home_team: Option<String>,
    #[serde(rename = "strAwayTeam", default)]
    away_team: Option<String>,
    #[serde(rename = "strVenue", default)]
    venue: Option<String>,
    #[serde(rename = "strTimestamp", default)]
    timestamp: Option<String>,
    #[serde(rename = "dateEvent", default)]
    date: Option<String>,
    #[serde(rename = "strTime", default)]
    time: Option<String>,
    #[serde(rename = "strStatus", default)]
    status: Option<String>,
    #[serde(rename = "intHomeScore", default)]
    home_score: Option<serde_json::Value>,
    #[serde(rename = "intAwayScore", default)]
    away_score: Option<serde_json::Value>,
}

fn status_from(raw: Option<&str>, has_score: bool) -> MatchStatus {
    match raw.map(str::trim) {
        Some("FT" | "AET" | "PEN" | "AOT" | "AP" | "Match Finished") => MatchStatus::Finished,
        Some("PST" | "Postponed" | "Match Postponed") => MatchStatus::Postponed,
        Some("CANC" | "Cancelled" | "Match Cancelled" | "ABD" | "Abandoned") => MatchStatus::Cancelled,
        Some("1H" | "HT" | "2H" | "ET" | "P" | "BT" | "Q1" | "Q2" | "Q3" | "Q4" | "OT" | "Live" | "In Progress") => {
            MatchStatus::Live
        }
        Some("NS" | "Not Started" | "TBD") => MatchStatus::Scheduled,
        _ if has_score => MatchStatus::Finished,
        _ => MatchStatus::Scheduled,
    }
}

fn convert(body: EventsResponse, league_id: &str) -> Vec<Match> {
    body.events
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| {
            let home = e.home_team.filter(|t| !t.is_empty())?;
            let away = e.away_team.filter(|t| !t.is_empty())?;
            let kickoff = e
                .timestamp
                .as_deref()
                .and_then(parse_timestamp)
                .or_else(|| parse_date_time(e.date.as_deref()?, e.time.as_deref()))?;

            let score = match (
                e.home_score.as_ref().and_then(json_u16),
                e.away_score.as_ref().and_then(json_u16),
            ) {
                (Some(h), Some(a)) => Some(Score::new(h, a)),
                _ => None,
            };

            let mut fixture = Match::new(e.id, league_id, home, away, kickoff)
                .with_status(status_from(e.status.as_deref(), score.is_some()));
            if let Some(venue) = e.venue.filter(|v| !v.is_empty()) {
                fixture = fixture.with_venue(venue);
            }
            if let Some(score) = score {
                fixture = fixture.with_score(score);
            }
            Some(fixture)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_events_is_empty() {
        let body: EventsResponse = serde_json::from_str(r#"{"events": null}"#).unwrap();
        assert!(convert(body, "nhl").is_empty());
    }

    #[test]
    fn test_convert_events() {
        let body: EventsResponse = serde_json::from_str(
            r#"{"events": [
                {
                    "idEvent": "2052711",
                    "strHomeTeam": "Boston Bruins",
                    "strAwayTeam": "Florida Panthers",
                    "strVenue": "TD Garden",
                    "strTimestamp": "2024-05-10T23:00:00",
                    "strStatus": "FT",
                    "intHomeScore": "2",
                    "intAwayScore": "6"
                },
                {
                    "idEvent": "2052712",
                    "strHomeTeam": "Dallas Stars",
                    "strAwayTeam": "Colorado Avalanche",
                    "dateEvent": "2024-05-11",
                    "strTime": "19:30:00",
                    "strStatus": "Not Started",
                    "intHomeScore": null,
                    "intAwayScore": null
                }
            ]}"#,
        )
        .unwrap();

        let matches = convert(body, "nhl");
        assert_eq!(matches.len(), 2);

        assert_eq!(matches[0].status, MatchStatus::Finished);
        assert_eq!(matches[0].score, Some(Score::new(2, 6)));
        assert_eq!(matches[0].venue.as_deref(), Some("TD Garden"));

        assert_eq!(matches[1].status, MatchStatus::Scheduled);
        assert_eq!(matches[1].match_day(), NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert!(matches[1].score.is_none());
    }

    #[test]
    fn test_status_falls_back_to_score_presence() {
        assert_eq!(status_from(None, true), MatchStatus::Finished);
        assert_eq!(status_from(Some(""), false), MatchStatus::Scheduled);
        assert_eq!(status_from(Some("HT"), true), MatchStatus::Live);
    }
}
