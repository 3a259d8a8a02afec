use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Server configuration persisted as TOML.
///
/// Delay fields shape the pacing of a game night: `reveal_delay_ms` is the
/// pause between a reveal phase and its resolution, the `bot_*` fields
/// humanize bot reaction times, and `lobby_cleanup_secs` is how long an
/// abandoned lobby lingers before it is dropped.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
    pub reveal_delay_ms: u64,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_timeout_ms: u64,
    pub lobby_cleanup_secs: u64,
    pub bot_base_delay_ms: u64,
    pub bot_stagger_ms: u64,
    pub bot_jitter_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            reveal_delay_ms: 2000,
            heartbeat_interval_secs: 10,
            heartbeat_timeout_ms: 1500,
            lobby_cleanup_secs: 300,
            bot_base_delay_ms: 1200,
            bot_stagger_ms: 400,
            bot_jitter_ms: 600,
        }
    }
}

impl Config {
    /// Load configuration from `path`. If the file does not exist, create it
    /// with defaults and return the default config.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            let cfg: Config = toml::from_str(&s)
                .with_context(|| format!("parsing TOML config '{}'", path.display()))?;
            Ok(cfg)
        } else {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("creating config directory '{}'", parent.display())
                    })?;
                }
            }
            let cfg = Config::default();
            let toml_text = toml::to_string_pretty(&cfg)
                .with_context(|| "serializing default config to TOML")?;
            fs::write(path, toml_text)
                .with_context(|| format!("writing default config to '{}'", path.display()))?;
            Ok(cfg)
        }
    }

    /// Save the current config back to `path` (overwrites).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory '{}'", parent.display()))?;
            }
        }
        let toml_text =
            toml::to_string_pretty(&self).with_context(|| "serializing config to TOML")?;
        fs::write(path, toml_text)
            .with_context(|| format!("writing config to '{}'", path.display()))?;
        Ok(())
    }
}
