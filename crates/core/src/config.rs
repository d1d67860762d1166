use crate::format::{CaseFormat, SpaceReplacement};
use crate::sanitize::DEFAULT_FALLBACK_BASE;
use anyhow::{bail, Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys accepted by [`AppConfig::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "target_dir",
    "save_by_default",
    "fallback_base",
    "case_format",
    "space_replacement",
];

/// User preferences. Missing keys take their default, so an old or hand
/// written file with only a couple of lines still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target_dir: PathBuf,
    pub save_by_default: bool,
    pub fallback_base: String,
    pub case_format: CaseFormat,
    pub space_replacement: SpaceReplacement,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            save_by_default: false,
            fallback_base: DEFAULT_FALLBACK_BASE.to_string(),
            case_format: CaseFormat::None,
            space_replacement: SpaceReplacement::Keep,
        }
    }
}

impl AppConfig {
    /// Reads `path`; a file that does not exist yet yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file: {}", path.display()))
            }
        };
        toml::from_str(&raw)
            .with_context(|| format!("config file is not valid: {}", path.display()))
    }

    /// Writes the whole config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }
        let body = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, body)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }

    /// Updates one setting from its textual form. Enum values use the same
    /// snake_case spelling as the config file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "target_dir" => self.target_dir = PathBuf::from(value),
            "save_by_default" => {
                self.save_by_default = value.parse().with_context(|| {
                    format!("save_by_default must be true or false, got {value:?}")
                })?
            }
            "fallback_base" => {
                if value.trim().is_empty() {
                    bail!("fallback_base cannot be blank");
                }
                self.fallback_base = value.to_string();
            }
            "case_format" => self.case_format = parse_choice(key, value)?,
            "space_replacement" => self.space_replacement = parse_choice(key, value)?,
            _ => bail!(
                "unknown config key {key:?} (expected one of: {})",
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

fn parse_choice<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .with_context(|| format!("invalid value {value:?} for {key}"))
}

/// Where the config file and the rename history live on this machine.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_path: PathBuf,
    pub history_dir: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let dirs = ProjectDirs::from("com", "vyron", "rename-bot")
        .context("could not determine the OS config directory")?;
    Ok(AppPaths {
        config_path: dirs.config_dir().join("config.toml"),
        history_dir: dirs.data_dir().join("history"),
    })
}

/// The user's Downloads folder, or the working directory when the OS does
/// not define one.
pub fn default_target_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
