use crate::app_dirs::AppDirs;
use crate::persist::{self, PersistenceError, StoredEntry};
use crate::session::Phase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_FOCUS_SECS: u32 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u32 = 5 * 60;
pub const DEFAULT_LONG_BREAK_SECS: u32 = 15 * 60;
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

pub const FOCUS_MINUTES: (u32, u32) = (1, 60);
pub const SHORT_BREAK_MINUTES: (u32, u32) = (1, 30);
pub const LONG_BREAK_MINUTES: (u32, u32) = (5, 45);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Blue,
    Green,
    Purple,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Default, Theme::Blue, Theme::Green, Theme::Purple];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Theme::Default),
            "blue" => Ok(Theme::Blue),
            "green" => Ok(Theme::Green),
            "purple" => Ok(Theme::Purple),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Persisted user configuration. Durations are whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(rename = "focusTime")]
    pub focus_secs: u32,
    #[serde(rename = "breakTime")]
    pub break_secs: u32,
    #[serde(rename = "longBreakTime")]
    pub long_break_secs: u32,
    #[serde(rename = "sessionsBeforeLongBreak")]
    pub sessions_before_long_break: u32,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            focus_secs: DEFAULT_FOCUS_SECS,
            break_secs: DEFAULT_BREAK_SECS,
            long_break_secs: DEFAULT_LONG_BREAK_SECS,
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            theme: Theme::Default,
        }
    }
}

impl Config {
    /// Configured length of a phase in seconds.
    pub fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::ShortBreak => self.break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }

    /// New config with the panel's durations and theme; the threshold is kept.
    pub fn with_settings(&self, input: &SettingsInput) -> Self {
        Self {
            focus_secs: input.focus_minutes.saturating_mul(60),
            break_secs: input.break_minutes.saturating_mul(60),
            long_break_secs: input.long_break_minutes.saturating_mul(60),
            sessions_before_long_break: self.sessions_before_long_break,
            theme: input.theme,
        }
    }

    /// Rebuild a config from a stored object, one field at a time.
    fn from_stored(map: &Map<String, Value>) -> Self {
        let defaults = Config::default();

        let secs = |key: &str, default: u32| {
            persist::positive_u32(map.get(key)).unwrap_or_else(|| {
                warn!(field = key, default = default, "config field missing or invalid, using default");
                default
            })
        };

        let theme = match map.get("theme") {
            Some(Value::String(s)) => s.parse::<Theme>().unwrap_or_else(|e| {
                warn!(error = %e, "config theme invalid, using default");
                defaults.theme
            }),
            _ => {
                warn!(field = "theme", "config field missing or invalid, using default");
                defaults.theme
            }
        };

        Self {
            focus_secs: secs("focusTime", defaults.focus_secs),
            break_secs: secs("breakTime", defaults.break_secs),
            long_break_secs: secs("longBreakTime", defaults.long_break_secs),
            sessions_before_long_break: secs(
                "sessionsBeforeLongBreak",
                defaults.sessions_before_long_break,
            ),
            theme,
        }
    }
}

/// Typed payload collected by the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsInput {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub long_break_minutes: u32,
    pub theme: Theme,
    pub session_type: Phase,
}

impl SettingsInput {
    /// Pre-fill the panel from the current config and phase.
    pub fn from_config(cfg: &Config, session_type: Phase) -> Self {
        Self {
            focus_minutes: cfg.focus_secs / 60,
            break_minutes: cfg.break_secs / 60,
            long_break_minutes: cfg.long_break_secs / 60,
            theme: cfg.theme,
            session_type,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(
            self.focus_minutes,
            self.break_minutes,
            self.long_break_minutes,
        )
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Focus length must be between {min} and {max} minutes")]
    FocusLength { min: u32, max: u32 },
    #[error("Short break must be between {min} and {max} minutes")]
    ShortBreak { min: u32, max: u32 },
    #[error("Long break must be between {min} and {max} minutes")]
    LongBreak { min: u32, max: u32 },
}

/// Check settings-panel durations (minutes). The first violated bound wins.
pub fn validate(
    focus_minutes: u32,
    break_minutes: u32,
    long_break_minutes: u32,
) -> Result<(), ValidationError> {
    let within = |v: u32, (min, max): (u32, u32)| (min..=max).contains(&v);

    if !within(focus_minutes, FOCUS_MINUTES) {
        let (min, max) = FOCUS_MINUTES;
        return Err(ValidationError::FocusLength { min, max });
    }
    if !within(break_minutes, SHORT_BREAK_MINUTES) {
        let (min, max) = SHORT_BREAK_MINUTES;
        return Err(ValidationError::ShortBreak { min, max });
    }
    if !within(long_break_minutes, LONG_BREAK_MINUTES) {
        let (min, max) = LONG_BREAK_MINUTES;
        return Err(ValidationError::LongBreak { min, max });
    }
    Ok(())
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::resolve().config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match persist::read_object(&self.path) {
            StoredEntry::Object(map) => Config::from_stored(&map),
            StoredEntry::Missing => Config::default(),
            StoredEntry::Corrupt => {
                warn!(path = %self.path.display(), "config entry corrupt, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), PersistenceError> {
        persist::write_entry(&self.path, cfg)
    }
}
