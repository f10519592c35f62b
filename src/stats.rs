use crate::app_dirs::AppDirs;
use crate::persist::{self, PersistenceError, StoredEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

const ISO_DAY_FMT: &str = "%Y-%m-%d";
// What a browser's `Date.toDateString()` produced, e.g. "Mon Oct 19 2026".
const LEGACY_DAY_FMT: &str = "%a %b %d %Y";

/// Cumulative progress counters. Only a completed focus session changes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stats {
    #[serde(rename = "totalSessions")]
    pub total_sessions: u32,
    /// Incremented on every focus completion and never reset.
    #[serde(rename = "todaySessions")]
    pub today_sessions: u32,
    pub streak: u32,
    #[serde(rename = "lastDate")]
    pub last_active_date: Option<NaiveDate>,
}

impl Stats {
    /// Count one finished focus session on `today` and carry the streak.
    pub fn record_focus_completion(&self, today: NaiveDate) -> Stats {
        let counted = Stats {
            total_sessions: self.total_sessions.saturating_add(1),
            today_sessions: self.today_sessions.saturating_add(1),
            ..self.clone()
        };
        counted.with_streak_update(today)
    }

    /// Streak bookkeeping alone: same day keeps it, the next day extends it,
    /// anything else (first use, a gap, a clock that went backwards) restarts
    /// it at one.
    pub fn with_streak_update(&self, today: NaiveDate) -> Stats {
        if self.last_active_date == Some(today) {
            return self.clone();
        }

        let yesterday = today.pred_opt();
        let streak = if self.last_active_date.is_some() && self.last_active_date == yesterday {
            self.streak.saturating_add(1)
        } else {
            1
        };

        Stats {
            streak,
            last_active_date: Some(today),
            ..self.clone()
        }
    }

    /// Whether the streak still counts on `today` (active today or yesterday).
    pub fn streak_is_live(&self, today: NaiveDate) -> bool {
        match self.last_active_date {
            Some(last) => last == today || today.pred_opt() == Some(last),
            None => false,
        }
    }

    fn from_stored(map: &Map<String, Value>) -> Self {
        let count = |key: &str| {
            persist::non_negative_u32(map.get(key)).unwrap_or_else(|| {
                if map.contains_key(key) {
                    warn!(field = key, "stats field invalid, using 0");
                }
                0
            })
        };

        let last_active_date = match map.get("lastDate") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => parse_day(s).or_else(|| {
                warn!(value = %s, "stats lastDate unreadable, dropping it");
                None
            }),
            Some(other) => {
                warn!(value = %other, "stats lastDate has wrong type, dropping it");
                None
            }
        };

        Self {
            total_sessions: count("totalSessions"),
            today_sessions: count("todaySessions"),
            streak: count("streak"),
            last_active_date,
        }
    }
}

/// Parse a stored calendar day (ISO first, then the legacy browser form).
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, ISO_DAY_FMT)
        .or_else(|_| NaiveDate::parse_from_str(s, LEGACY_DAY_FMT))
        .ok()
}

pub trait StatsStore {
    fn load(&self) -> Stats;
    fn save(&self, stats: &Stats) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct FileStatsStore {
    path: PathBuf,
}

impl FileStatsStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::resolve().stats_path(),
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

impl Default for FileStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for FileStatsStore {
    fn load(&self) -> Stats {
        match persist::read_object(&self.path) {
            StoredEntry::Object(map) => Stats::from_stored(&map),
            StoredEntry::Missing => Stats::default(),
            StoredEntry::Corrupt => {
                warn!(path = %self.path.display(), "stats entry corrupt, starting from zero");
                Stats::default()
            }
        }
    }

    fn save(&self, stats: &Stats) -> Result<(), PersistenceError> {
        persist::write_entry(&self.path, stats)
    }
}
