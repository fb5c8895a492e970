//! Source adapters: one per external provider, parameterized by the provider keys in
//! each [`LeagueConfig`] rather than by per-league code.

pub mod http;
pub mod football_data;
pub mod thesportsdb;
pub mod espn;

pub use football_data::FootballDataAdapter;
pub use thesportsdb::TheSportsDbAdapter;
pub use espn::EspnAdapter;

use async_trait::async_trait;
use chrono::NaiveDate;
use tipster_models::{LeagueConfig, Match, Result};

/// Contract every provider integration satisfies.
///
/// An adapter never fabricates fixtures. When its provider cannot be reached it returns
/// an empty list or a `ProviderUnavailable` / `MalformedProviderResponse` error, and the
/// registry moves on to the next candidate either way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this provider has a mapping for the league at all.
    fn supports(&self, league: &LeagueConfig) -> bool;

    /// Upcoming and in-progress fixtures.
    async fn fetch(&self, league: &LeagueConfig) -> Result<Vec<Match>>;

    /// Fixtures played on `date`, with final scores where known.
    async fn fetch_results(&self, league: &LeagueConfig, date: NaiveDate) -> Result<Vec<Match>>;
}
