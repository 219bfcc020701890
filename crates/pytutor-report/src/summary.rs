//! Progress summary: the record joined with catalog totals.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use pytutor_core::leveling::{points_to_next_level, rank_for};
use pytutor_core::model::{Catalog, Stage};
use pytutor_core::progress::ProgressRecord;

/// Completion of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    pub challenges_completed: usize,
    pub challenges_total: usize,
    /// Points earned in this stage.
    pub points: u64,
}

impl StageSummary {
    pub fn is_complete(&self) -> bool {
        self.lessons_completed == self.lessons_total
            && self.challenges_completed == self.challenges_total
    }
}

/// Everything the stats view shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub username: String,
    pub level: u32,
    /// Rank label, e.g. "Apprentice".
    pub rank: String,
    pub total_points: u64,
    pub points_to_next_level: u64,
    pub current_stage: Stage,
    pub stages: Vec<StageSummary>,
    /// Unlocked achievements in unlock order.
    pub achievements: Vec<String>,
    /// Achievements the catalog offers that are still locked.
    pub locked_achievements: Vec<String>,
    pub last_played: Option<NaiveDateTime>,
    pub generated_at: DateTime<Utc>,
}

impl ProgressSummary {
    /// Build a summary for `record` against `catalog`.
    ///
    /// Completion counts only include ids the catalog still contains, so a
    /// record made with a different catalog never shows more than 100%.
    pub fn from_record(record: &ProgressRecord, catalog: &Catalog) -> Self {
        let stages = Stage::ALL
            .iter()
            .map(|&stage| StageSummary {
                stage,
                lessons_completed: catalog
                    .lessons_in(stage)
                    .filter(|l| record.is_lesson_complete(&l.id))
                    .count(),
                lessons_total: catalog.lessons_in(stage).count(),
                challenges_completed: catalog
                    .challenges_in(stage)
                    .filter(|c| record.is_challenge_complete(&c.id))
                    .count(),
                challenges_total: catalog.challenges_in(stage).count(),
                points: record.stage_stats(stage).points,
            })
            .collect();

        let locked_achievements = catalog_achievements(catalog)
            .into_iter()
            .filter(|label| !record.achievements.contains(label))
            .collect();

        Self {
            username: record.username.clone(),
            level: record.level,
            rank: rank_for(record.total_points).to_string(),
            total_points: record.total_points,
            points_to_next_level: points_to_next_level(record.total_points),
            current_stage: record.current_stage,
            stages,
            achievements: record.achievements.iter().map(str::to_string).collect(),
            locked_achievements,
            last_played: record.last_played,
            generated_at: Utc::now(),
        }
    }

    /// Display name, falling back to "Learner".
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            "Learner"
        } else {
            &self.username
        }
    }

    /// Share of catalog items completed, 0.0 to 1.0.
    pub fn completion(&self) -> f64 {
        let (done, total) = self.stages.iter().fold((0, 0), |(done, total), s| {
            (
                done + s.lessons_completed + s.challenges_completed,
                total + s.lessons_total + s.challenges_total,
            )
        });
        if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        }
    }
}

/// Every achievement label a catalog can award, deduplicated, in stage order.
fn catalog_achievements(catalog: &Catalog) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut push = |label: &str| {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    };

    for stage in Stage::ALL {
        for lesson in catalog.lessons_in(stage) {
            if let Some(label) = &lesson.perfect_achievement {
                push(label);
            }
        }
        if let Some((label, _)) = catalog.lesson_mastery(stage) {
            push(label);
        }
        if let Some((label, _)) = catalog.challenge_mastery(stage) {
            push(label);
        }
    }
    if let Some((label, _)) = catalog.capstone() {
        push(label);
    }
    labels
}
