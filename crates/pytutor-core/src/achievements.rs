//! Achievement registry and unlock rules.

use serde::{Deserialize, Serialize};

use crate::model::{Catalog, Stage};
use crate::progress::ProgressRecord;

/// Ordered set of unlocked achievement labels.
///
/// Insertion order is preserved for display; inserting a label twice is
/// a no-op that reports `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Achievements(Vec<String>);

impl Achievements {
    /// Insert `label`, returning `true` only if it was not already present.
    pub fn insert(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.0.push(label.to_string());
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|a| a == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Achievements that a challenge completion in `stage` makes due and that
/// are not yet unlocked: stage mastery first, then the capstone.
pub fn due_after_challenge(record: &ProgressRecord, catalog: &Catalog, stage: Stage) -> Vec<String> {
    let mut due = Vec::new();

    if let Some((label, threshold)) = catalog.challenge_mastery(stage) {
        if record.stage_stats(stage).challenges >= threshold && !record.achievements.contains(label)
        {
            due.push(label.to_string());
        }
    }

    if let Some((label, threshold)) = catalog.capstone() {
        if record.completed_challenges.len() >= threshold && !record.achievements.contains(label) {
            due.push(label.to_string());
        }
    }

    due
}

/// Lesson-mastery achievement made due by a lesson completion in `stage`.
pub fn due_after_lesson(record: &ProgressRecord, catalog: &Catalog, stage: Stage) -> Option<String> {
    let (label, threshold) = catalog.lesson_mastery(stage)?;
    (record.stage_stats(stage).lessons >= threshold && !record.achievements.contains(label))
        .then(|| label.to_string())
}
