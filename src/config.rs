use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::composer::DEFAULT_QUERY;

// ── Profile ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the drafting assistant (serves /api/threads, /coach, ...)
    pub base_url: String,
    /// Search query run on startup
    #[serde(default = "default_query")]
    pub default_query: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_query: default_query(),
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Which profile to use when none is specified
    #[serde(default = "default_profile_name")]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

fn default_profile_name() -> String {
    "default".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            default_profile: default_profile_name(),
            profiles: HashMap::new(),
        }
    }
}

impl ConfigFile {
    /// Load from the standard location, or defaults if there is no file yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    /// Write a starter config file (only if it doesn't exist).
    pub fn write_default_if_missing() -> Result<PathBuf> {
        let path = config_path();
        write_default_at(&path)?;
        Ok(path)
    }

    pub fn resolve_profile(&self, name: Option<&str>) -> Option<&Profile> {
        let key = name.unwrap_or(&self.default_profile);
        self.profiles.get(key)
    }
}

fn write_default_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write config file at {}", path.display()))
}

// ── Resolved runtime config (after merging file + CLI overrides) ──────────────

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub query: String,
    /// Profile name that was resolved (for display)
    pub profile_name: String,
}

impl ResolvedConfig {
    /// Priority: CLI args > env vars (handled by clap) > config file profile > built-in defaults
    pub fn resolve(
        file: &ConfigFile,
        profile_override: Option<&str>,
        base_url_override: Option<&str>,
        query_override: Option<&str>,
    ) -> Self {
        let profile_name = profile_override
            .unwrap_or(&file.default_profile)
            .to_string();

        let base = file
            .resolve_profile(profile_override)
            .cloned()
            .unwrap_or_default();

        Self {
            base_url: base_url_override
                .map(str::to_string)
                .unwrap_or(base.base_url),
            query: query_override
                .map(str::to_string)
                .unwrap_or(base.default_query),
            profile_name,
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
        .join("tonecoach")
        .join("config.toml")
}

/// Where the log file lives; the terminal belongs to the TUI.
pub fn log_path() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state")
        .join("tonecoach")
        .join("tonecoach.log")
}

fn xdg_dir(var: &str, home_fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(home_fallback))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

// ── Default config template written on first run ──────────────────────────────

const DEFAULT_CONFIG_TOML: &str = r#"# tonecoach configuration
# Run `tonecoach --init` to regenerate this file.

default_profile = "local"

# ── Local assistant server (default) ──────────────────────────────────────────
[profiles.local]
base_url      = "http://127.0.0.1:5000"
default_query = "in:inbox"

# ── Unread only ───────────────────────────────────────────────────────────────
# [profiles.unread]
# base_url      = "http://127.0.0.1:5000"
# default_query = "in:inbox is:unread"

# ── Remote deployment ─────────────────────────────────────────────────────────
# [profiles.remote]
# base_url      = "https://coach.example.com"
"#;
