use thiserror::Error;

#[derive(Error, Debug)]
pub enum TipsterError {
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Malformed response from {provider}: {reason}")]
    MalformedProviderResponse { provider: String, reason: String },

    #[error("No data available for league {league}")]
    NoDataForLeague { league: String },

    #[error("Ledger conflict on {date} for match {match_id}: completed record kept")]
    LedgerConflict { date: String, match_id: String },

    #[error("Selection for league {league} was superseded by a newer request")]
    SelectionSuperseded { league: String },

    #[error("Invalid odds: {0}")]
    InvalidOdds(String),

    #[error("Invalid league id: {0:?}")]
    InvalidLeagueId(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TipsterError {
    pub fn unavailable(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedProviderResponse {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Adapter-level failures that advance the fallback chain.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::MalformedProviderResponse { .. }
        )
    }

    /// Errors a caller may retry as-is. `NoDataForLeague` is an answer, not a failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::MalformedProviderResponse { .. }
                | Self::SelectionSuperseded { .. }
                | Self::Storage(_)
                | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TipsterError>;
