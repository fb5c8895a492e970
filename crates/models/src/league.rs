use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Soccer,
    Basketball,
    AmericanFootball,
    Baseball,
    Hockey,
}

impl Sport {
    /// Whether a match can end level and a draw is a valid pick.
    pub fn allows_draw(&self) -> bool {
        matches!(self, Sport::Soccer)
    }
}

/// Provider-specific identifiers for one league. A `None` means the provider has no
/// coverage and its adapter is left out of the league's candidate list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderKeys {
    /// football-data.org competition code, e.g. `PL`.
    pub football_data: Option<String>,
    /// TheSportsDB numeric league id.
    pub thesportsdb: Option<String>,
    /// ESPN `{sport}/{league}` path segment, e.g. `soccer/eng.1`.
    pub espn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeagueConfig {
    pub id: String,
    pub name: String,
    pub sport: Sport,
    pub providers: ProviderKeys,
}

impl LeagueConfig {
    pub fn new(id: &str, name: &str, sport: Sport) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sport,
            providers: ProviderKeys::default(),
        }
    }

    pub fn with_football_data(mut self, code: &str) -> Self {
        self.providers.football_data = Some(code.to_string());
        self
    }

    pub fn with_thesportsdb(mut self, id: &str) -> Self {
        self.providers.thesportsdb = Some(id.to_string());
        self
    }

    pub fn with_espn(mut self, path: &str) -> Self {
        self.providers.espn = Some(path.to_string());
        self
    }
}

/// Leagues served out of the box.
pub fn default_catalog() -> Vec<LeagueConfig> {
    use Sport::*;

    vec![
        LeagueConfig::new("epl", "English Premier League", Soccer)
            .with_football_data("PL")
            .with_thesportsdb("4328")
            .with_espn("soccer/eng.1"),
        LeagueConfig::new("laliga", "La Liga", Soccer)
            .with_football_data("PD")
            .with_thesportsdb("4335")
            .with_espn("soccer/esp.1"),
        LeagueConfig::new("bundesliga", "Bundesliga", Soccer)
            .with_football_data("BL1")
            .with_thesportsdb("4331")
            .with_espn("soccer/ger.1"),
        LeagueConfig::new("seriea", "Serie A", Soccer)
            .with_football_data("SA")
            .with_thesportsdb("4332")
            .with_espn("soccer/ita.1"),
        LeagueConfig::new("ligue1", "Ligue 1", Soccer)
            .with_football_data("FL1")
            .with_thesportsdb("4334")
            .with_espn("soccer/fra.1"),
        LeagueConfig::new("ucl", "UEFA Champions League", Soccer)
            .with_football_data("CL")
            .with_thesportsdb("4480")
            .with_espn("soccer/uefa.champions"),
        LeagueConfig::new("mls", "Major League Soccer", Soccer)
            .with_thesportsdb("4346")
            .with_espn("soccer/usa.1"),
        LeagueConfig::new("nba", "NBA", Basketball)
            .with_thesportsdb("4387")
            .with_espn("basketball/nba"),
        LeagueConfig::new("wnba", "WNBA", Basketball)
            .with_thesportsdb("4516")
            .with_espn("basketball/wnba"),
        LeagueConfig::new("ncaab", "NCAA Men's Basketball", Basketball)
            .with_thesportsdb("4607")
            .with_espn("basketball/mens-college-basketball"),
        LeagueConfig::new("nfl", "NFL", AmericanFootball)
            .with_thesportsdb("4391")
            .with_espn("football/nfl"),
        LeagueConfig::new("ncaaf", "NCAA Football", AmericanFootball)
            .with_thesportsdb("4479")
            .with_espn("football/college-football"),
        LeagueConfig::new("mlb", "MLB", Baseball)
            .with_thesportsdb("4424")
            .with_espn("baseball/mlb"),
        LeagueConfig::new("nhl", "NHL", Hockey)
            .with_thesportsdb("4380")
            .with_espn("hockey/nhl"),
    ]
}
