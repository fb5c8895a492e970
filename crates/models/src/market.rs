use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use crate::error::{TipsterError, Result};

/// Market odds in decimal format as quoted by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketOdds {
    pub provider: String,
    pub home: Decimal,
    pub draw: Option<Decimal>,
    pub away: Decimal,
}

impl MarketOdds {
    pub fn new(provider: impl Into<String>, home: Decimal, draw: Option<Decimal>, away: Decimal) -> Result<Self> {
        for price in [Some(home), draw, Some(away)].into_iter().flatten() {
            if price <= Decimal::ONE {
                return Err(TipsterError::InvalidOdds(format!(
                    "decimal odds must exceed 1.0, got {price}"
                )));
            }
        }
        Ok(Self { provider: provider.into(), home, draw, away })
    }

    /// Moneyline quotes such as `-150` / `+130`.
    pub fn from_american(provider: impl Into<String>, home: i32, draw: Option<i32>, away: i32) -> Result<Self> {
        let draw = draw.map(american_to_decimal).transpose()?;
        Self::new(provider, american_to_decimal(home)?, draw, american_to_decimal(away)?)
    }

    /// Raw implied probabilities, bookmaker margin included.
    pub fn implied(&self) -> (f64, Option<f64>, f64) {
        (implied(self.home), self.draw.map(implied), implied(self.away))
    }

    /// Sum of implied probabilities; 1.0 is a perfectly fair book.
    pub fn overround(&self) -> f64 {
        let (home, draw, away) = self.implied();
        home + draw.unwrap_or(0.0) + away
    }

    /// Implied probabilities with the margin removed.
    pub fn fair_probabilities(&self) -> OutcomeProbabilities {
        let (home, draw, away) = self.implied();
        OutcomeProbabilities::normalized(home, draw, away)
    }
}

fn implied(odds: Decimal) -> f64 {
    odds.to_f64().filter(|o| *o > 0.0).map_or(0.0, |o| 1.0 / o)
}

pub fn american_to_decimal(american: i32) -> Result<Decimal> {
    if american == 0 {
        return Err(TipsterError::InvalidOdds("American odds cannot be zero".to_string()));
    }

    let decimal = if american > 0 {
        Decimal::from(american) / Decimal::from(100) + Decimal::ONE
    } else {
        Decimal::from(100) / Decimal::from(-i64::from(american)) + Decimal::ONE
    };

    Ok(decimal)
}

/// A probability in `[0,1]`. The only way out to a percentage is [`Probability::to_percent`],
/// so a value cannot be scaled twice by accident.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd, Default)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_percent(self) -> f64 {
        self.0 * 100.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomeProbabilities {
    pub home: Probability,
    pub draw: Option<Probability>,
    pub away: Probability,
}

/// Outcome probabilities surfaced to callers, in `[0,100]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomePercentages {
    pub home: f64,
    pub draw: Option<f64>,
    pub away: f64,
}

impl OutcomeProbabilities {
    /// Scales the raw weights so they sum to one. Degenerate input falls back to an even split.
    pub fn normalized(home: f64, draw: Option<f64>, away: f64) -> Self {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let (home, draw, away) = (clean(home), draw.map(clean), clean(away));
        let total = home + draw.unwrap_or(0.0) + away;

        if total <= 0.0 {
            let even = 1.0 / if draw.is_some() { 3.0 } else { 2.0 };
            return Self {
                home: Probability::new(even),
                draw: draw.map(|_| Probability::new(even)),
                away: Probability::new(even),
            };
        }

        Self {
            home: Probability::new(home / total),
            draw: draw.map(|d| Probability::new(d / total)),
            away: Probability::new(away / total),
        }
    }

    /// Drops the draw outcome and renormalizes home/away.
    pub fn two_way(&self) -> Self {
        Self::normalized(self.home.value(), None, self.away.value())
    }

    pub fn to_percentages(&self) -> OutcomePercentages {
        OutcomePercentages {
            home: self.home.to_percent(),
            draw: self.draw.map(Probability::to_percent),
            away: self.away.to_percent(),
        }
    }
}
