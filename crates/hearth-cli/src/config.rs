use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// SQLite file; created on first use.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Filter terms applied by `hearth list` when none are given, e.g. `["open", "person:alice"]`.
    #[serde(default)]
    pub default_filters: Vec<String>,
}

fn default_database_path() -> String {
    "hearth.db".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            default_filters: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("hearth.toml"))
            .merge(Env::prefixed("HEARTH_"))
            .extract()
    }
}
