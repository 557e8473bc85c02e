//! Configuration file management for lessonplan.
//!
//! Provides a TOML-based config file at `~/.config/lessonplan/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lessonplan_core::gateway::{GatewayConfig, GenerationConfig};

/// Environment variable carrying the model provider credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "LESSONPLAN_MODEL";
pub const BASE_URL_ENV: &str = "LESSONPLAN_BASE_URL";
pub const TIMEOUT_ENV: &str = "LESSONPLAN_TIMEOUT_SECS";
pub const BIND_ENV: &str = "LESSONPLAN_BIND";
pub const PORT_ENV: &str = "LESSONPLAN_PORT";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Provider model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the lessonplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/lessonplan` or
/// `~/.config/lessonplan`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("lessonplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("lessonplan")
}

/// Return the path to the lessonplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Load the config file if one exists. A file that exists but does not
/// parse is an error.
fn load_config_if_present() -> Result<Option<ConfigFile>> {
    if config_path().exists() {
        load_config().map(Some)
    } else {
        Ok(None)
    }
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The file may hold the API key.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub model: Option<&'a str>,
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct LessonPlanConfig {
    pub gateway: GatewayConfig,
    pub bind: String,
    pub port: u16,
}

impl LessonPlanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `GEMINI_API_KEY` env > `model.api_key` > none (reported
    ///   on the first model call)
    /// - Model: `--model` > `LESSONPLAN_MODEL` > `model.name` > `gemini-2.5-flash`
    /// - Bind/port: `--bind`/`--port` > `LESSONPLAN_BIND`/`LESSONPLAN_PORT`
    ///   > `[server]` > `127.0.0.1:8080`
    pub fn resolve(overrides: Overrides<'_>) -> Result<Self> {
        let file = load_config_if_present()?.unwrap_or_default();
        let model = file.model;
        let server = file.server;

        let api_key = env_var(API_KEY_ENV).or(model.api_key);

        let defaults = GenerationConfig::default();
        let generation = GenerationConfig {
            model: overrides
                .model
                .map(str::to_string)
                .or_else(|| env_var(MODEL_ENV))
                .or(model.name)
                .unwrap_or(defaults.model),
            max_output_tokens: model.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            temperature: model.temperature.unwrap_or(defaults.temperature),
            top_p: model.top_p.unwrap_or(defaults.top_p),
            thinking_budget: model.thinking_budget.or(defaults.thinking_budget),
        };

        let timeout_secs = match env_var(TIMEOUT_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV} is not a whole number of seconds: {raw}"))?,
            None => model
                .timeout_secs
                .unwrap_or(GatewayConfig::DEFAULT_TIMEOUT_SECS),
        };

        let mut gateway = GatewayConfig::new(api_key)
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_generation(generation);
        if let Some(base_url) = env_var(BASE_URL_ENV).or(model.base_url) {
            gateway = gateway.with_base_url(base_url);
        }

        let bind = overrides
            .bind
            .map(str::to_string)
            .or_else(|| env_var(BIND_ENV))
            .or(server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match overrides.port {
            Some(port) => port,
            None => match env_var(PORT_ENV) {
                Some(raw) => raw
                    .parse::<u16>()
                    .with_context(|| format!("{PORT_ENV} is not a valid port: {raw}"))?,
                None => server.port.unwrap_or(DEFAULT_PORT),
            },
        };

        Ok(Self {
            gateway,
            bind,
            port,
        })
    }
}

/// Read an env var, treating an empty value as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
