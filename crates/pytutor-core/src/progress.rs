//! Durable progress record and its store.
//!
//! The record is small, so every mutation rewrites the whole file. The
//! write lands in a temporary file next to the target and is renamed over
//! it, so the on-disk record is always a complete, consistent snapshot of
//! the in-memory one once a public operation returns.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::achievements::Achievements;
use crate::error::ProgressError;
use crate::leveling::level_for;
use crate::model::Stage;

/// Per-stage counters, incremented in lockstep with completion events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    #[serde(default)]
    pub lessons: usize,
    #[serde(default)]
    pub challenges: usize,
    #[serde(default)]
    pub points: u64,
}

/// One learner's cumulative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_stage")]
    pub current_stage: Stage,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub completed_challenges: Vec<String>,
    #[serde(default)]
    pub achievements: Achievements,
    /// Local time of the last persisted mutation.
    #[serde(default)]
    pub last_played: Option<NaiveDateTime>,
    #[serde(default = "default_stats")]
    pub stats: BTreeMap<Stage, StageStats>,
    /// Fields this version does not use, written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_level() -> u32 {
    1
}

fn default_stage() -> Stage {
    Stage::Beginner
}

fn default_stats() -> BTreeMap<Stage, StageStats> {
    Stage::ALL
        .iter()
        .map(|s| (*s, StageStats::default()))
        .collect()
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            username: String::new(),
            total_points: 0,
            level: default_level(),
            current_stage: default_stage(),
            completed_lessons: Vec::new(),
            completed_challenges: Vec::new(),
            achievements: Achievements::default(),
            last_played: None,
            stats: default_stats(),
            extra: serde_json::Map::new(),
        }
    }
}

impl ProgressRecord {
    /// Counters for a stage (zeroes if the stage was never touched).
    pub fn stage_stats(&self, stage: Stage) -> StageStats {
        self.stats.get(&stage).copied().unwrap_or_default()
    }

    pub fn is_challenge_complete(&self, id: &str) -> bool {
        self.completed_challenges.iter().any(|c| c == id)
    }

    pub fn is_lesson_complete(&self, id: &str) -> bool {
        self.completed_lessons.iter().any(|l| l == id)
    }

    fn stats_mut(&mut self, stage: Stage) -> &mut StageStats {
        self.stats.entry(stage).or_default()
    }

    /// Re-derive fields that must never drift from their sources.
    fn normalize(&mut self) {
        self.level = level_for(self.total_points);
        for stage in Stage::ALL {
            self.stats.entry(stage).or_default();
        }
    }
}

/// Level before and after a point change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.to > self.from
    }
}

/// The single learner's record, bound to its save file.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    record: ProgressRecord,
}

impl ProgressStore {
    /// Load the record at `path`, or start from defaults if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let mut record = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<ProgressRecord>(&content).map_err(|source| {
                ProgressError::Malformed {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no progress file at {}, starting fresh", path.display());
                ProgressRecord::default()
            }
            Err(source) => return Err(ProgressError::Io { path, source }),
        };
        record.normalize();
        Ok(Self { path, record })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Add points to the total and to `stage`, recompute the level, persist.
    pub fn add_points(&mut self, amount: u32, stage: Stage) -> Result<LevelChange, ProgressError> {
        let from = self.record.level;
        self.record.total_points += u64::from(amount);
        self.record.stats_mut(stage).points += u64::from(amount);
        self.record.level = level_for(self.record.total_points);
        let change = LevelChange {
            from,
            to: self.record.level,
        };
        if change.leveled_up() {
            tracing::info!(from, to = change.to, "level up");
        }
        self.persist()?;
        Ok(change)
    }

    /// Record a lesson completion. Returns `false` if it was already complete.
    pub fn mark_lesson_complete(&mut self, id: &str, stage: Stage) -> Result<bool, ProgressError> {
        if self.record.is_lesson_complete(id) {
            return Ok(false);
        }
        self.record.completed_lessons.push(id.to_string());
        self.record.stats_mut(stage).lessons += 1;
        self.persist()?;
        Ok(true)
    }

    /// Record a challenge completion. Returns `false` if it was already complete.
    pub fn mark_challenge_complete(
        &mut self,
        id: &str,
        stage: Stage,
    ) -> Result<bool, ProgressError> {
        if self.record.is_challenge_complete(id) {
            return Ok(false);
        }
        self.record.completed_challenges.push(id.to_string());
        self.record.stats_mut(stage).challenges += 1;
        self.persist()?;
        Ok(true)
    }

    /// Unlock an achievement. Returns `true` only for a new unlock.
    pub fn unlock_achievement(&mut self, label: &str) -> Result<bool, ProgressError> {
        if !self.record.achievements.insert(label) {
            return Ok(false);
        }
        tracing::info!(achievement = label, "achievement unlocked");
        self.persist()?;
        Ok(true)
    }

    pub fn set_username(&mut self, username: &str) -> Result<(), ProgressError> {
        self.record.username = username.trim().to_string();
        self.persist()
    }

    pub fn set_current_stage(&mut self, stage: Stage) -> Result<(), ProgressError> {
        if self.record.current_stage == stage {
            return Ok(());
        }
        self.record.current_stage = stage;
        self.persist()
    }

    /// Persist the current record again (used on shutdown).
    pub fn flush(&mut self) -> Result<(), ProgressError> {
        self.persist()
    }

    fn persist(&mut self) -> Result<(), ProgressError> {
        self.record.last_played = Some(chrono::Local::now().naive_local());

        let io_err = |source: std::io::Error| ProgressError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(io_err)?;

        let json = serde_json::to_string_pretty(&self.record).map_err(|e| io_err(e.into()))?;
        let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!(path = %self.path.display(), "progress saved");
        Ok(())
    }
}
