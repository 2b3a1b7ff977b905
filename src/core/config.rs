//! Trainer configuration
//!
//! Two pieces of configuration feed the rest of the crate:
//!
//! - [`ReviewConfig`] - the spaced-repetition constants used by the scheduler
//! - [`TrainerPaths`] - where repertoires, review records, backups and the
//!   fallback engine live on disk
//!
//! # Settings File
//!
//! `settings.json` in the trainer home directory may override the defaults.
//! Durations are written in humantime notation:
//!
//! ```json
//! {
//!   "initial_interval": "10m",
//!   "growth_factor": 6,
//!   "max_interval": "60days",
//!   "engine_movetime": "1s"
//! }
//! ```
//!
//! A missing file means defaults; a malformed one is a startup error.
//!
//! # Directory Layout
//!
//! ```text
//! <home>/
//!   settings.json
//!   engine                  fallback UCI engine binary
//!   repertoire/white/**.pgn source lines when training White
//!   repertoire/black/**.pgn source lines when training Black
//!   review/white.pgn        persisted review tree for White
//!   review/black.pgn
//!   review/backup/          copies made before moves are pruned
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use tracing::info;

use crate::core::error::{CoreError, CoreResult};

/// Settings filename inside the trainer home
const SETTINGS_FILENAME: &str = "settings.json";

/// Home directory name used when none is given
const DEFAULT_HOME_DIRNAME: &str = ".repertoire-trainer";

/// Spaced-repetition constants
///
/// # Fields
///
/// - `initial_interval`: Interval given to a never-reviewed or failed move
/// - `growth_factor`: Multiplier applied after a correct, on-time answer
/// - `max_interval`: Upper bound for the interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewConfig {
    pub initial_interval: TimeDelta,
    pub growth_factor: i32,
    pub max_interval: TimeDelta,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            initial_interval: TimeDelta::minutes(10),
            growth_factor: 6,
            max_interval: TimeDelta::days(60),
        }
    }
}

impl ReviewConfig {
    /// Reject configurations that would make intervals shrink or vanish
    pub fn validate(&self) -> CoreResult<()> {
        if self.initial_interval <= TimeDelta::zero() {
            return Err(CoreError::InvalidReviewConfig {
                message: "initial interval must be positive".to_string(),
            });
        }
        if self.growth_factor < 1 {
            return Err(CoreError::InvalidReviewConfig {
                message: format!("growth factor {} is below 1", self.growth_factor),
            });
        }
        if self.max_interval < self.initial_interval {
            return Err(CoreError::InvalidReviewConfig {
                message: "maximum interval is shorter than the initial interval".to_string(),
            });
        }
        Ok(())
    }
}

/// User-editable settings, persisted as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(with = "duration_text")]
    pub initial_interval: Duration,
    pub growth_factor: u32,
    #[serde(with = "duration_text")]
    pub max_interval: Duration,
    /// Search time granted to the fallback engine per move
    #[serde(with = "duration_text")]
    pub engine_movetime: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(10 * 60),
            growth_factor: 6,
            max_interval: Duration::from_secs(60 * 24 * 3600),
            engine_movetime: Duration::from_secs(1),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            info!("[SETTINGS] No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&contents)?;
        info!("[SETTINGS] Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scheduler constants derived from these settings
    pub fn review_config(&self) -> CoreResult<ReviewConfig> {
        let config = ReviewConfig {
            initial_interval: to_time_delta(self.initial_interval)?,
            growth_factor: i32::try_from(self.growth_factor).map_err(|_| {
                CoreError::InvalidReviewConfig {
                    message: format!("growth factor {} is too large", self.growth_factor),
                }
            })?,
            max_interval: to_time_delta(self.max_interval)?,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a humantime duration such as `10m`, `6h` or `2days`
pub fn parse_duration(text: &str) -> CoreResult<Duration> {
    humantime::parse_duration(text).map_err(|err| CoreError::InvalidDuration {
        value: text.to_string(),
        message: err.to_string(),
    })
}

fn to_time_delta(duration: Duration) -> CoreResult<TimeDelta> {
    TimeDelta::from_std(duration).map_err(|err| CoreError::InvalidDuration {
        value: humantime::format_duration(duration).to_string(),
        message: err.to_string(),
    })
}

mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// On-disk layout of the trainer data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerPaths {
    home: PathBuf,
}

impl TrainerPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// `~/.repertoire-trainer`
    pub fn default_home() -> CoreResult<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(DEFAULT_HOME_DIRNAME))
            .ok_or(CoreError::NoHomeDirectory)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn settings_file(&self) -> PathBuf {
        self.home.join(SETTINGS_FILENAME)
    }

    pub fn engine(&self) -> PathBuf {
        self.home.join("engine")
    }

    /// Directory scanned for source PGN files of one color
    pub fn repertoire_dir(&self, color: Color) -> PathBuf {
        self.home.join("repertoire").join(color_name(color))
    }

    pub fn review_dir(&self) -> PathBuf {
        self.home.join("review")
    }

    /// Persisted review tree of one color
    pub fn review_file(&self, color: Color) -> PathBuf {
        self.review_dir().join(format!("{}.pgn", color_name(color)))
    }

    /// Create the review and repertoire directories if they are missing
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        for dir in [
            self.review_dir(),
            self.repertoire_dir(Color::White),
            self.repertoire_dir(Color::Black),
        ] {
            fs::create_dir_all(&dir).map_err(|source| CoreError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

/// Lower-case color name used in file and directory names
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
