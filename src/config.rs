use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tipster_ml::ConsensusConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub resolution: ResolutionConfig,
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    pub adapter_timeout_ms: u64,
    pub cache_ttl_seconds: i64,
    pub reconcile_on_select: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub grace_period_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub football_data_api_key: Option<String>,
    pub football_data_base_url: String,
    pub thesportsdb_api_key: String,
    pub thesportsdb_base_url: String,
    pub espn_base_url: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("ledger.data_dir", "data/ledger")?
            .set_default("resolution.adapter_timeout_ms", 10_000)?
            .set_default("resolution.cache_ttl_seconds", 300)?
            .set_default("resolution.reconcile_on_select", true)?
            .set_default("reconciler.grace_period_minutes", 180)?
            .set_default("providers.football_data_base_url", tipster_services::adapters::football_data::DEFAULT_BASE_URL)?
            .set_default("providers.thesportsdb_api_key", tipster_services::adapters::thesportsdb::PUBLIC_KEY)?
            .set_default("providers.thesportsdb_base_url", tipster_services::adapters::thesportsdb::DEFAULT_BASE_URL)?
            .set_default("providers.espn_base_url", tipster_services::adapters::espn::DEFAULT_BASE_URL)?
            // Add in settings from configuration file
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // TIPSTER__PROVIDERS__FOOTBALL_DATA_API_KEY etc.
            .add_source(Environment::with_prefix("TIPSTER").prefix_separator("__").separator("__"))
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.consensus
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(app)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.resolution.adapter_timeout_ms.max(1))
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.resolution.cache_ttl_seconds.max(0))
    }

    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reconciler.grace_period_minutes.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let config = AppConfig::new().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.adapter_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), chrono::Duration::minutes(5));
        assert_eq!(config.grace_period(), chrono::Duration::hours(3));
        assert_eq!(config.consensus, ConsensusConfig::default());
        assert_eq!(config.providers.thesportsdb_api_key, "3");
    }
}
