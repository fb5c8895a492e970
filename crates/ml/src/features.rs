// Signal extraction

use std::ops::Range;
use tipster_models::{Match, MarketOdds, Signal, SignalKind, SignalSet};
use crate::seed::seeded_score;

/// Turns a match into its eight home-lean signals. Real data on the match is used where
/// present; everything else falls back to a seeded value for the matchup.
#[derive(Debug, Clone, Default)]
pub struct SignalExtractor;

impl SignalExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, fixture: &Match) -> SignalSet {
        let market_odds = fixture
            .odds
            .as_ref()
            .map_or_else(|| self.fallback(fixture, SignalKind::MarketOdds), |odds| Signal::observed(market_lean(odds)));

        let market_efficiency = fixture
            .odds
            .as_ref()
            .map_or_else(|| self.fallback(fixture, SignalKind::MarketEfficiency), |odds| {
                Signal::observed(efficiency_lean(odds))
            });

        let team_performance = match (fixture.home_record, fixture.away_record) {
            (Some(home), Some(away)) => match (home.win_rate(), away.win_rate()) {
                (Some(h), Some(a)) => Signal::observed(50.0 + (h - a) * 50.0),
                _ => self.fallback(fixture, SignalKind::TeamPerformance),
            },
            _ => self.fallback(fixture, SignalKind::TeamPerformance),
        };

        SignalSet {
            market_odds,
            head_to_head: self.fallback(fixture, SignalKind::HeadToHead),
            venue_weather: self.fallback(fixture, SignalKind::VenueWeather),
            sentiment: self.fallback(fixture, SignalKind::Sentiment),
            market_efficiency,
            team_performance,
            key_players: self.fallback(fixture, SignalKind::KeyPlayers),
            x_factor: self.fallback(fixture, SignalKind::XFactor),
        }
    }

    fn fallback(&self, fixture: &Match, kind: SignalKind) -> Signal {
        Signal::seeded(seeded_score(&fixture.home_team, &fixture.away_team, kind, fallback_range(kind)))
    }
}

/// Ranges for seeded values. Kept inside `[0,100]` and mostly near neutral; venue leans home.
fn fallback_range(kind: SignalKind) -> Range<f64> {
    match kind {
        SignalKind::MarketOdds => 35.0..65.0,
        SignalKind::HeadToHead => 30.0..70.0,
        SignalKind::VenueWeather => 45.0..68.0,
        SignalKind::Sentiment => 35.0..65.0,
        SignalKind::MarketEfficiency => 40.0..60.0,
        SignalKind::TeamPerformance => 30.0..70.0,
        SignalKind::KeyPlayers => 35.0..65.0,
        SignalKind::XFactor => 40.0..60.0,
    }
}

/// Home share of the two-way fair price.
fn market_lean(odds: &MarketOdds) -> f64 {
    odds.fair_probabilities().two_way().home.to_percent()
}

/// A tight book (low margin) is trusted more: the market lean is pulled toward neutral
/// in proportion to the overround.
fn efficiency_lean(odds: &MarketOdds) -> f64 {
    let efficiency = (1.0 - (odds.overround() - 1.0) * 5.0).clamp(0.0, 1.0);
    50.0 + (market_lean(odds) - 50.0) * efficiency
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tipster_models::{SignalSource, TeamRecord};

    fn fixture() -> Match {
        Match::new("m1", "epl", "Arsenal", "Chelsea", Utc::now())
    }

    #[test]
    fn test_without_data_everything_is_seeded() {
        let signals = SignalExtractor::new().extract(&fixture());
        assert_eq!(signals.observed_count(), 0);
        for (kind, signal) in signals.iter() {
            assert!(fallback_range(kind).contains(&signal.value), "{kind:?} out of range");
        }
    }

    #[test]
    fn test_real_odds_are_used() {
        let odds = MarketOdds::new("espn", dec!(1.5), Some(dec!(4.0)), dec!(6.0)).unwrap();
        let signals = SignalExtractor::new().extract(&fixture().with_odds(odds));

        assert_eq!(signals.market_odds.source, SignalSource::Observed);
        assert_eq!(signals.market_efficiency.source, SignalSource::Observed);
        assert!(signals.market_odds.value > 70.0);
        assert!(signals.market_efficiency.value > 50.0);
        assert!(signals.market_efficiency.value <= signals.market_odds.value);
    }

    #[test]
    fn test_records_drive_team_performance() {
        let strong = TeamRecord { wins: 9, losses: 1, draws: 0 };
        let weak = TeamRecord { wins: 1, losses: 9, draws: 0 };
        let signals = SignalExtractor::new().extract(&fixture().with_records(strong, weak));

        assert_eq!(signals.team_performance.source, SignalSource::Observed);
        assert!((signals.team_performance.value - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_records_fall_back() {
        let empty = TeamRecord { wins: 0, losses: 0, draws: 0 };
        let signals = SignalExtractor::new().extract(&fixture().with_records(empty, empty));
        assert_eq!(signals.team_performance.source, SignalSource::Seeded);
    }
}
