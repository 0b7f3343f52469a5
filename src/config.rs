use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::kernel::settings::{PlaybackSettings, CHUNK_RANGE, DEFAULT_RATE_STEP, WPM_RANGE};

pub const CONFIG_PATH_ENV: &str = "RSVP_CONFIG";
pub const WPM_ENV: &str = "RSVP_WPM";
pub const CHUNK_SIZE_ENV: &str = "RSVP_CHUNK_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Initial playback settings for every loaded text.
    pub playback: PlaybackSettings,
    /// WPM change per faster/slower keypress.
    pub rate_step: u32,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            rate_step: DEFAULT_RATE_STEP,
            log_filter: "info".to_string(),
        }
    }
}

impl ReaderConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_json(&json)
    }

    /// File (explicit path, else `RSVP_CONFIG`, else defaults), then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV);
        let path = path.or(env_path.as_deref().map(Path::new));

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `RSVP_WPM` / `RSVP_CHUNK_SIZE` as looked up by `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(WPM_ENV) {
            self.playback.words_per_minute = parse_env(WPM_ENV, &raw)?;
        }
        if let Some(raw) = lookup(CHUNK_SIZE_ENV) {
            self.playback.chunk_size = parse_env(CHUNK_SIZE_ENV, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wpm = self.playback.words_per_minute;
        if !WPM_RANGE.contains(&wpm) {
            return Err(ConfigError::OutOfRange {
                field: "playback.words_per_minute",
                value: i64::from(wpm),
                allowed: format!("{:?}", WPM_RANGE),
            });
        }

        let chunk = self.playback.chunk_size;
        if !CHUNK_RANGE.contains(&chunk) {
            return Err(ConfigError::OutOfRange {
                field: "playback.chunk_size",
                value: i64::try_from(chunk).unwrap_or(i64::MAX),
                allowed: format!("{:?}", CHUNK_RANGE),
            });
        }

        let span = WPM_RANGE.end() - WPM_RANGE.start();
        if self.rate_step == 0 || self.rate_step > span {
            return Err(ConfigError::OutOfRange {
                field: "rate_step",
                value: i64::from(self.rate_step),
                allowed: format!("1..={}", span),
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: raw.to_string(),
    })
}
