use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level bot configuration, loaded from themery.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub discord: DiscordSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub web_address: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            web_address: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:themery.db?mode=rwc".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DiscordSection {
    /// Bot token used for the platform REST calls.
    pub token: String,
    pub api_base: String,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://discord.com/api/v10".into(),
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WEB_ADDRESS") {
            self.server.web_address = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("DISCORD_TOKEN") {
            self.discord.token = v;
        }
        if let Ok(v) = std::env::var("DISCORD_API_BASE") {
            self.discord.api_base = v;
        }
    }
}
