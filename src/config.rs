use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE_URL: &str = "https://my-data-api-4qlf.onrender.com";
pub const DEFAULT_CONFIG_FILE: &str = "smartviz.toml";
pub const ENV_PREFIX: &str = "SMARTVIZ";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    /// Show backend failures in the status bar instead of only logging them
    pub show_network_errors: bool,
    pub notice_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub filter: String,
}

impl Config {
    /// Load defaults, then `path` (or `smartviz.toml` if present), then
    /// `SMARTVIZ_*` environment variables.
    ///
    /// Nested keys use a double underscore: `SMARTVIZ_API__BASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Self::defaults()?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("api.base_url", DEFAULT_API_BASE_URL)?
            .set_default("ui.tick_rate_ms", 100)?
            .set_default("ui.show_network_errors", false)?
            .set_default("ui.notice_capacity", 20)?
            .set_default("export.dir", "exports")?
            .set_default("logging.dir", "logs")?
            .set_default("logging.filter", "smartviz=info")?)
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
            },
            ui: UiConfig {
                tick_rate_ms: 100,
                show_network_errors: false,
                notice_capacity: 20,
            },
            export: ExportConfig {
                dir: PathBuf::from("exports"),
            },
            logging: LoggingConfig {
                dir: PathBuf::from("logs"),
                filter: "smartviz=info".to_string(),
            },
        }
    }
}
