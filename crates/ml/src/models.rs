// Weighted consensus model

use tipster_models::{
    Consensus, Match, OutcomeProbabilities, Result, ScoredMatch, Side, SignalKind, SignalSet, Sport,
};
use tracing::debug;
use crate::features::SignalExtractor;
use crate::weights::ConsensusConfig;

/// Scores a match into a pick and a confidence. Pure: the same match always yields the
/// same signals and consensus.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
    extractor: SignalExtractor,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: SignalExtractor::new(),
        })
    }

    pub fn score(&self, fixture: &Match, sport: Sport) -> ScoredMatch {
        let signals = self.extractor.extract(fixture);
        let probabilities = self.outcome_probabilities(fixture, &signals, sport);
        let pick = self.pick(&probabilities, sport);
        let confidence = self.confidence(&signals, pick);
        let reasoning = self.reasoning(fixture, &signals, pick, confidence);

        debug!(
            match_id = %fixture.id,
            pick = ?pick,
            confidence,
            observed = signals.observed_count(),
            "🧮 Scored {}", fixture.matchup_label()
        );

        ScoredMatch {
            fixture: fixture.clone(),
            consensus: Consensus {
                pick,
                confidence,
                probabilities: probabilities.to_percentages(),
                reasoning,
            },
            signals,
        }
    }

    /// Outcome probabilities come from the market: quoted prices when the adapter
    /// supplied them, otherwise the market-odds signal.
    fn outcome_probabilities(&self, fixture: &Match, signals: &SignalSet, sport: Sport) -> OutcomeProbabilities {
        let quoted = fixture.odds.as_ref().map(|odds| odds.fair_probabilities());

        if !sport.allows_draw() {
            return match quoted {
                Some(probs) => probs.two_way(),
                None => {
                    let home = signals.market_odds.value / 100.0;
                    OutcomeProbabilities::normalized(home, None, 1.0 - home)
                }
            };
        }

        match quoted {
            Some(probs) if probs.draw.is_some() => probs,
            Some(probs) => self.with_draw_estimate(probs.two_way().home.value()),
            None => self.with_draw_estimate(signals.market_odds.value / 100.0),
        }
    }

    /// Spreads a draw probability over a two-way home share. Closer matchups draw more.
    fn with_draw_estimate(&self, home_share: f64) -> OutcomeProbabilities {
        let home_share = home_share.clamp(0.0, 1.0);
        let draw = self.config.draw_base_rate * (1.0 - (2.0 * home_share - 1.0).abs());
        OutcomeProbabilities::normalized(
            home_share * (1.0 - draw),
            Some(draw),
            (1.0 - home_share) * (1.0 - draw),
        )
    }

    fn pick(&self, probs: &OutcomeProbabilities, sport: Sport) -> Side {
        if sport.allows_draw() {
            if let Some(draw) = probs.draw {
                if draw >= probs.home && draw >= probs.away && draw.value() >= self.config.draw_threshold {
                    return Side::Draw;
                }
            }
        }

        if probs.home >= probs.away {
            Side::Home
        } else {
            Side::Away
        }
    }

    /// Weighted mean of the signals, each oriented toward the pick.
    fn confidence(&self, signals: &SignalSet, pick: Side) -> f64 {
        let weights = &self.config.weights;
        let total = weights.total();
        if total <= 0.0 {
            return 50.0;
        }

        let weighted: f64 = signals
            .iter()
            .map(|(kind, signal)| weights.weight(kind) * orient(signal.value, pick))
            .sum();

        ((weighted / total).clamp(0.0, 100.0) * 10.0).round() / 10.0
    }

    fn reasoning(&self, fixture: &Match, signals: &SignalSet, pick: Side, confidence: f64) -> String {
        let mut contributions: Vec<(SignalKind, f64, f64)> = signals
            .iter()
            .map(|(kind, signal)| {
                let pull = self.config.weights.weight(kind) * (signal.value - 50.0).abs();
                (kind, signal.value, pull)
            })
            .collect();
        contributions.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));

        let leaders: Vec<String> = contributions
            .iter()
            .take(2)
            .map(|(kind, value, _)| {
                let source = if signals.get(*kind).is_observed() { "observed" } else { "seeded" };
                format!("{} {value:.1} ({source})", kind.label())
            })
            .collect();

        let subject = match pick {
            Side::Home => fixture.home_team.as_str(),
            Side::Away => fixture.away_team.as_str(),
            Side::Draw => "the draw",
        };

        format!(
            "Picked {subject} at {confidence:.1}% confidence; strongest signals: {}; {}/8 signals from live data",
            leaders.join(", "),
            signals.observed_count()
        )
    }
}

/// Maps a home-lean score onto "agreement with the pick".
fn orient(value: f64, pick: Side) -> f64 {
    match pick {
        Side::Home => value,
        Side::Away => 100.0 - value,
        Side::Draw => 100.0 - 2.0 * (value - 50.0).abs(),
    }
}
