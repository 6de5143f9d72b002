//! TOML-based application settings.
//!
//! Stores user preferences including:
//! - Phase durations
//! - Micro-break toggle and length
//! - Auto-advance and sound flags
//! - Focus presets (minutes)
//!
//! Settings are stored at `<data dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::momentum::DEFAULT_FOCUS_PRESETS;
use crate::timer::Phase;

/// Default length of each phase, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurations {
    #[serde(default = "default_hypothesize_secs")]
    pub hypothesize_secs: u32,
    /// Initial focus target before any inference has run.
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u32,
    #[serde(default = "default_reflect_secs")]
    pub reflect_secs: u32,
}

/// Micro-break configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroBreakConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_micro_break_secs")]
    pub duration_secs: u32,
}

/// Application settings.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub durations: PhaseDurations,
    #[serde(default)]
    pub micro_break: MicroBreakConfig,
    #[serde(default = "default_true")]
    pub auto_advance: bool,
    #[serde(default)]
    pub sound: bool,
    /// Allowed focus lengths in minutes.
    #[serde(default = "default_focus_presets")]
    pub focus_presets: Vec<u32>,
}

// Default functions
fn default_hypothesize_secs() -> u32 {
    120
}
fn default_focus_secs() -> u32 {
    14 * 60
}
fn default_reflect_secs() -> u32 {
    90
}
fn default_micro_break_secs() -> u32 {
    20
}
fn default_true() -> bool {
    true
}
fn default_focus_presets() -> Vec<u32> {
    DEFAULT_FOCUS_PRESETS.to_vec()
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            hypothesize_secs: default_hypothesize_secs(),
            focus_secs: default_focus_secs(),
            reflect_secs: default_reflect_secs(),
        }
    }
}

impl Default for MicroBreakConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: default_micro_break_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            micro_break: MicroBreakConfig::default(),
            auto_advance: true,
            sound: false,
            focus_presets: default_focus_presets(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => {
                    let b = parse_flag(value)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as bool")))?;
                    serde_json::Value::Bool(b)
                }
                serde_json::Value::Number(_) => value
                    .parse::<u32>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
                serde_json::Value::Array(_) => parse_list(value).map_err(invalid)?,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the settings file in the data directory.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default settings cannot be written when the file is missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                settings.validate()?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load from disk, returning defaults on any error.
    /// Malformed settings are logged and otherwise ignored.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable settings, using defaults");
            Self::default()
        })
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field. The settings are left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Settings = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject settings the timer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focus_presets.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "focus_presets".into(),
                message: "at least one preset is required".into(),
            });
        }
        if self.focus_presets.contains(&0) {
            return Err(ConfigError::InvalidValue {
                key: "focus_presets".into(),
                message: "presets must be at least one minute".into(),
            });
        }
        Ok(())
    }

    /// Default countdown for `phase`. Focus uses the live target instead.
    pub fn phase_secs(&self, phase: Phase, target_focus_secs: u32) -> u32 {
        match phase {
            Phase::Hypothesize => self.durations.hypothesize_secs,
            Phase::Focus => target_focus_secs,
            Phase::Reflect => self.durations.reflect_secs,
        }
    }

    /// Preset minutes for hot-key slot `slot` (0-based), falling back to the
    /// built-in preset for that slot.
    pub fn preset_for_slot(&self, slot: usize) -> Option<u32> {
        self.focus_presets
            .get(slot)
            .copied()
            .or_else(|| DEFAULT_FOCUS_PRESETS.get(slot).copied())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Accepts `[7, 14]` or `7,14`.
fn parse_list(value: &str) -> std::result::Result<serde_json::Value, String> {
    let trimmed = value.trim().trim_start_matches('[').trim_end_matches(']');
    let items = trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| format!("cannot parse '{s}' as a whole number"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(serde_json::Value::Array(items))
}
