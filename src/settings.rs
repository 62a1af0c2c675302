use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub container: String,
    pub county_selector: String,
    pub state_selector: String,
    pub output_path: String,
    pub database_name: String,
    pub db_compression_enabled: bool,
    pub listen_addr: String,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("container", &self.container)
            .field("county_selector", &self.county_selector)
            .field("state_selector", &self.state_selector)
            .field("output_path", &self.output_path)
            .field("database_name", &self.database_name)
            .field("db_compression_enabled", &self.db_compression_enabled)
            .field("listen_addr", &self.listen_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    /// Defaults, then `Settings.toml` if present, then `COUNTY_*` env vars.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("Settings")
    }

    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("endpoint", "http://127.0.0.1:6666/")?
            .set_default("container", "#vis")?
            .set_default("county_selector", "#county")?
            .set_default("state_selector", "#state")?
            .set_default("output_path", "search-results.html")?
            .set_default("database_name", "bls_unemployment.sled")?
            .set_default("db_compression_enabled", false)?
            .set_default("listen_addr", "127.0.0.1:6666")?
            .set_default("request_timeout_secs", 10)?
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("COUNTY"))
            .build()?
            .try_deserialize()
    }

    pub fn selectors(&self) -> crate::search::Selectors {
        crate::search::Selectors {
            county: self.county_selector.clone(),
            state: self.state_selector.clone(),
            container: self.container.clone(),
        }
    }
}
