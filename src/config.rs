use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default remote directory feed.
const DEFAULT_DIRECTORY_URL: &str =
    "https://raw.githubusercontent.com/ImudTrust/TerminalData/refs/heads/main/playerids.txt";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// URL of the plain-text trust directory.
    pub directory_url: String,
    /// Seconds between automatic directory refresh attempts.
    pub refresh_interval_secs: u64,
    /// Tags further than this from the viewer are hidden.  `None` disables
    /// the distance gate entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_display_distance: Option<f32>,
    /// Text slots allocated per overlay.
    pub line_budget: usize,
    /// Emit a join notification when a new player appears in the roster.
    pub notify_joins: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_url: DEFAULT_DIRECTORY_URL.into(),
            refresh_interval_secs: 10,
            max_display_distance: Some(5.0),
            line_budget: 5,
            notify_joins: true,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("trusttags.toml"))
            .merge(Json::file("trusttags.json"))
            .merge(Env::prefixed("TRUSTTAGS_"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        if config.line_budget == 0 {
            return Err(anyhow::anyhow!("line_budget must be at least 1"));
        }

        Ok(config)
    }
}
