use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use crate::market::MarketOdds;

/// A fixture as reported by one provider. Identity is `(league, id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: String,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub venue: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<MarketOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_record: Option<TeamRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_record: Option<TeamRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub home: u16,
    pub away: u16,
}

/// Which way a match went, or which way a pick leans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
    Draw,
}

/// Season record as `wins-losses[-draws]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamRecord {
    pub wins: u16,
    pub losses: u16,
    #[serde(default)]
    pub draws: u16,
}

impl Match {
    pub fn new(
        id: impl Into<String>,
        league: impl Into<String>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            league: league.into(),
            home_team: home_team.into(),
            away_team: away_team.into(),
            venue: None,
            scheduled_time,
            status: MatchStatus::Scheduled,
            score: None,
            odds: None,
            home_record: None,
            away_record: None,
        }
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_odds(mut self, odds: MarketOdds) -> Self {
        self.odds = Some(odds);
        self
    }

    pub fn with_records(mut self, home: TeamRecord, away: TeamRecord) -> Self {
        self.home_record = Some(home);
        self.away_record = Some(away);
        self
    }

    /// The match day this fixture is filed under in the ledger.
    pub fn match_day(&self) -> NaiveDate {
        self.scheduled_time.date_naive()
    }

    pub fn matchup_label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status, MatchStatus::Live)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, MatchStatus::Finished)
    }

    /// Final outcome, only once the match is finished and a score is known.
    pub fn final_outcome(&self) -> Option<(Side, Score)> {
        match (self.status, self.score) {
            (MatchStatus::Finished, Some(score)) => Some((score.outcome(), score)),
            _ => None,
        }
    }
}

impl Score {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }

    pub fn outcome(&self) -> Side {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Side::Home,
            std::cmp::Ordering::Less => Side::Away,
            std::cmp::Ordering::Equal => Side::Draw,
        }
    }
}

impl TeamRecord {
    /// Parses `"10-5"` or `"10-5-2"`.
    pub fn parse(summary: &str) -> Option<Self> {
        let mut parts = summary.trim().split('-').map(|p| p.trim().parse::<u16>());
        let wins = parts.next()?.ok()?;
        let losses = parts.next()?.ok()?;
        let draws = match parts.next() {
            Some(d) => d.ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { wins, losses, draws })
    }

    pub fn games(&self) -> u32 {
        u32::from(self.wins) + u32::from(self.losses) + u32::from(self.draws)
    }

    /// Points share in `[0,1]`, draws counted as half a win.
    pub fn win_rate(&self) -> Option<f64> {
        let games = self.games();
        if games == 0 {
            return None;
        }
        Some((f64::from(self.wins) + 0.5 * f64::from(self.draws)) / f64::from(games))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Match {
        Match::new("m1", "epl", "Arsenal", "Chelsea", Utc::now())
    }

    #[test]
    fn test_match_creation() {
        let m = fixture().with_venue("Emirates Stadium");

        assert_eq!(m.id, "m1");
        assert_eq!(m.home_team, "Arsenal");
        assert_eq!(m.matchup_label(), "Arsenal vs Chelsea");
        assert_eq!(m.venue.as_deref(), Some("Emirates Stadium"));
        assert!(!m.is_live());
        assert!(!m.is_finished());
    }

    #[test]
    fn test_final_outcome_requires_finished_status() {
        let live = fixture().with_status(MatchStatus::Live).with_score(Score::new(1, 0));
        assert_eq!(live.final_outcome(), None);

        let done = fixture().with_status(MatchStatus::Finished).with_score(Score::new(1, 1));
        assert_eq!(done.final_outcome(), Some((Side::Draw, Score::new(1, 1))));
    }

    #[test]
    fn test_score_outcome() {
        assert_eq!(Score::new(2, 1).outcome(), Side::Home);
        assert_eq!(Score::new(0, 3).outcome(), Side::Away);
        assert_eq!(Score::new(0, 0).outcome(), Side::Draw);
    }

    #[test]
    fn test_team_record_parse() {
        assert_eq!(TeamRecord::parse("10-5"), Some(TeamRecord { wins: 10, losses: 5, draws: 0 }));
        assert_eq!(TeamRecord::parse("8-3-4"), Some(TeamRecord { wins: 8, losses: 3, draws: 4 }));
        assert_eq!(TeamRecord::parse("abc"), None);
        assert_eq!(TeamRecord::parse("1-2-3-4"), None);

        let record = TeamRecord::parse("2-1-2").unwrap();
        assert!((record.win_rate().unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(TeamRecord::parse("0-0").unwrap().win_rate(), None);
    }

    #[test]
    fn test_team_record_large_counts() {
        let record = TeamRecord::parse("40000-40000").unwrap();
        assert_eq!(record.games(), 80_000);
        assert!((record.win_rate().unwrap() - 0.5).abs() < 1e-9);
    }
}
