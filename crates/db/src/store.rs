use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tipster_models::{Ledger, Result, TipsterError};
use tracing::debug;

/// Where ledgers live. One ledger per league.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Missing ledgers load as empty.
    async fn load(&self, league: &str) -> Result<Ledger>;
    async fn save(&self, league: &str, ledger: &Ledger) -> Result<()>;
    async fn leagues(&self) -> Result<Vec<String>>;
}

/// `<root>/<league>.json`, each file shaped exactly like [`Ledger`].
pub struct JsonFileLedgerStore {
    root: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, league: &str) -> Result<PathBuf> {
        validate_league_id(league)?;
        Ok(self.root.join(format!("{league}.json")))
    }
}

/// League ids become file names, so only a safe alphabet is accepted.
fn validate_league_id(league: &str) -> Result<()> {
    let ok = !league.is_empty()
        && league.len() <= 64
        && league.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(TipsterError::InvalidLeagueId(league.to_string()))
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedgerStore {
    async fn load(&self, league: &str) -> Result<Ledger> {
        let path = self.path_for(league)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Ledger::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, league: &str, ledger: &Ledger) -> Result<()> {
        let path = self.path_for(league)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Write then rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(ledger)?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("💾 Saved ledger for {} ({} records) to {}", league, ledger.len(), path.display());
        Ok(())
    }

    async fn leagues(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut leagues = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_league_id(stem).is_ok() {
                    leagues.push(stem.to_string());
                }
            }
        }
        leagues.sort();
        Ok(leagues)
    }
}

/// Volatile store for tests and dry runs.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledgers: Mutex<HashMap<String, Ledger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self, league: &str) -> Result<Ledger> {
        Ok(self.ledgers.lock().get(league).cloned().unwrap_or_default())
    }

    async fn save(&self, league: &str, ledger: &Ledger) -> Result<()> {
        self.ledgers.lock().insert(league.to_string(), ledger.clone());
        Ok(())
    }

    async fn leagues(&self) -> Result<Vec<String>> {
        let mut leagues: Vec<String> = self.ledgers.lock().keys().cloned().collect();
        leagues.sort();
        Ok(leagues)
    }
}
