use serde::{Deserialize, Serialize};
use crate::events::{Match, Side};
use crate::market::OutcomePercentages;

/// The eight independent inputs to a consensus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    MarketOdds,
    HeadToHead,
    VenueWeather,
    Sentiment,
    MarketEfficiency,
    TeamPerformance,
    KeyPlayers,
    XFactor,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        SignalKind::MarketOdds,
        SignalKind::HeadToHead,
        SignalKind::VenueWeather,
        SignalKind::Sentiment,
        SignalKind::MarketEfficiency,
        SignalKind::TeamPerformance,
        SignalKind::KeyPlayers,
        SignalKind::XFactor,
    ];

    /// Stable name, also used as the seed salt for fallback values.
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::MarketOdds => "market_odds",
            SignalKind::HeadToHead => "head_to_head",
            SignalKind::VenueWeather => "venue_weather",
            SignalKind::Sentiment => "sentiment",
            SignalKind::MarketEfficiency => "market_efficiency",
            SignalKind::TeamPerformance => "team_performance",
            SignalKind::KeyPlayers => "key_players",
            SignalKind::XFactor => "x_factor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::MarketOdds => "market odds",
            SignalKind::HeadToHead => "head-to-head",
            SignalKind::VenueWeather => "venue/weather",
            SignalKind::Sentiment => "sentiment",
            SignalKind::MarketEfficiency => "market efficiency",
            SignalKind::TeamPerformance => "team form",
            SignalKind::KeyPlayers => "key players",
            SignalKind::XFactor => "x-factor",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Derived from real data the adapter supplied.
    Observed,
    /// Deterministic match-seeded fallback.
    Seeded,
}

/// A home-lean score in `[0,100]`: 50 is neutral, above 50 favours the home side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub value: f64,
    pub source: SignalSource,
}

impl Signal {
    pub fn observed(value: f64) -> Self {
        Self { value: clamp_score(value), source: SignalSource::Observed }
    }

    pub fn seeded(value: f64) -> Self {
        Self { value: clamp_score(value), source: SignalSource::Seeded }
    }

    pub fn is_observed(&self) -> bool {
        self.source == SignalSource::Observed
    }
}

/// Clamps to `[0,100]`; NaN maps to the neutral 50.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        50.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Every signal is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalSet {
    pub market_odds: Signal,
    pub head_to_head: Signal,
    pub venue_weather: Signal,
    pub sentiment: Signal,
    pub market_efficiency: Signal,
    pub team_performance: Signal,
    pub key_players: Signal,
    pub x_factor: Signal,
}

impl SignalSet {
    pub fn get(&self, kind: SignalKind) -> Signal {
        match kind {
            SignalKind::MarketOdds => self.market_odds,
            SignalKind::HeadToHead => self.head_to_head,
            SignalKind::VenueWeather => self.venue_weather,
            SignalKind::Sentiment => self.sentiment,
            SignalKind::MarketEfficiency => self.market_efficiency,
            SignalKind::TeamPerformance => self.team_performance,
            SignalKind::KeyPlayers => self.key_players,
            SignalKind::XFactor => self.x_factor,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalKind, Signal)> + '_ {
        SignalKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn observed_count(&self) -> usize {
        self.iter().filter(|(_, s)| s.is_observed()).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consensus {
    pub pick: Side,
    /// In `[0,100]`.
    pub confidence: f64,
    pub probabilities: OutcomePercentages,
    pub reasoning: String,
}

/// A match together with the signals and consensus derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMatch {
    #[serde(rename = "match")]
    pub fixture: Match,
    pub signals: SignalSet,
    pub consensus: Consensus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_set(value: f64) -> SignalSet {
        let s = Signal::seeded(value);
        SignalSet {
            market_odds: Signal::observed(value),
            head_to_head: s,
            venue_weather: s,
            sentiment: s,
            market_efficiency: s,
            team_performance: s,
            key_players: s,
            x_factor: s,
        }
    }

    #[test]
    fn test_signal_clamping() {
        assert_eq!(Signal::seeded(140.0).value, 100.0);
        assert_eq!(Signal::observed(-3.0).value, 0.0);
        assert_eq!(Signal::seeded(f64::NAN).value, 50.0);
    }

    #[test]
    fn test_signal_set_iterates_all_kinds() {
        let set = flat_set(55.0);
        let kinds: Vec<_> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, SignalKind::ALL.to_vec());
        assert_eq!(set.observed_count(), 1);
    }

    #[test]
    fn test_signal_names_are_unique() {
        let names: std::collections::HashSet<_> = SignalKind::ALL.iter().map(SignalKind::name).collect();
        assert_eq!(names.len(), 8);
    }
}
