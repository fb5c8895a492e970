use serde::{Deserialize, Serialize};
use tipster_models::{SignalKind, TipsterError, Result};

/// Relative weight of each signal in the confidence score. Only ratios matter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalWeights {
    pub market_odds: f64,
    pub head_to_head: f64,
    pub venue_weather: f64,
    pub sentiment: f64,
    pub market_efficiency: f64,
    pub team_performance: f64,
    pub key_players: f64,
    pub x_factor: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            market_odds: 0.25,
            head_to_head: 0.15,
            venue_weather: 0.08,
            sentiment: 0.07,
            market_efficiency: 0.08,
            team_performance: 0.20,
            key_players: 0.12,
            x_factor: 0.05,
        }
    }
}

impl SignalWeights {
    pub fn weight(&self, kind: SignalKind) -> f64 {
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

    pub fn total(&self) -> f64 {
        SignalKind::ALL.iter().map(|k| self.weight(*k)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsensusConfig {
    pub weights: SignalWeights,
    /// A draw is only picked when its probability is the maximum and at least this.
    pub draw_threshold: f64,
    /// Draw probability for an evenly matched fixture when no market quotes a draw.
    pub draw_base_rate: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            draw_threshold: 0.45,
            draw_base_rate: 0.27,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<()> {
        for kind in SignalKind::ALL {
            let w = self.weights.weight(kind);
            if !w.is_finite() || w < 0.0 {
                return Err(TipsterError::Config(format!(
                    "weight for {} must be a non-negative number, got {w}",
                    kind.name()
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(TipsterError::Config("at least one signal weight must be positive".to_string()));
        }
        for (name, value) in [("draw_threshold", self.draw_threshold), ("draw_base_rate", self.draw_base_rate)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TipsterError::Config(format!("{name} must be within [0,1], got {value}")));
            }
        }
        Ok(())
    }
}
