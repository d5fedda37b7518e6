//! Service configuration, layered from built-in defaults, an optional TOML
//! file and `WASTESORT_`-prefixed environment variables (`__` separates
//! nested keys, e.g. `WASTESORT_GEMINI__API_KEY`)

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_PREFIX: &str = "WASTESORT";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub gemini: GeminiSettings,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct GeminiSettings {
    #[serde(default)]
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Whole-request timeout. Unset means the HTTP client never times out
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeminiSettings {{ api_key: <redacted>, endpoint: {:?}, model: {:?}, timeout_secs: {:?} }}",
            self.endpoint, self.model, self.timeout_secs
        )
    }
}

impl Settings {
    /// Load settings, reading `file` (TOML) if one is given
    pub fn load(file: Option<&str>) -> Result<Self> {
        Self::load_with_env_prefix(file, ENV_PREFIX)
    }

    fn load_with_env_prefix(file: Option<&str>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("gemini.endpoint", DEFAULT_ENDPOINT)?
            .set_default("gemini.model", DEFAULT_MODEL)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = file {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| match file {
                Some(path) => format!("failed to load configuration from {path}"),
                None => "failed to load configuration".to_string(),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.gemini.api_key.trim().is_empty() {
            bail!(
                "gemini.api_key is not set (use the config file or {ENV_PREFIX}_GEMINI__API_KEY)"
            );
        }
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be greater than zero");
        }
        if self.gemini.timeout_secs == Some(0) {
            bail!("gemini.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
