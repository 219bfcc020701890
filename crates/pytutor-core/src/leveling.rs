//! Leveling policy: cumulative points to level and rank.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Points needed per level.
pub const POINTS_PER_LEVEL: u64 = 100;

/// Level for a point total: one level per 100 points, starting at 1.
pub fn level_for(total_points: u64) -> u32 {
    u32::try_from(total_points / POINTS_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Points still missing before the next level.
pub fn points_to_next_level(total_points: u64) -> u64 {
    POINTS_PER_LEVEL - total_points % POINTS_PER_LEVEL
}

/// Rank label shown next to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Newbie,
    Apprentice,
    Intermediate,
    Advanced,
    Expert,
    PythonMaster,
}

impl Rank {
    /// Lower point bound of each rank, ascending.
    const THRESHOLDS: [(u64, Rank); 6] = [
        (0, Rank::Newbie),
        (100, Rank::Apprentice),
        (300, Rank::Intermediate),
        (600, Rank::Advanced),
        (1000, Rank::Expert),
        (1500, Rank::PythonMaster),
    ];

    /// Point range description, e.g. "100-299 points".
    pub fn range(self) -> String {
        let idx = Self::THRESHOLDS
            .iter()
            .position(|(_, r)| *r == self)
            .unwrap_or(0);
        let low = Self::THRESHOLDS[idx].0;
        match Self::THRESHOLDS.get(idx + 1) {
            Some((next, _)) => format!("{low}-{} points", next - 1),
            None => format!("{low}+ points"),
        }
    }

    pub fn all() -> impl Iterator<Item = Rank> {
        Self::THRESHOLDS.iter().map(|(_, r)| *r)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::Newbie => "Newbie",
            Rank::Apprentice => "Apprentice",
            Rank::Intermediate => "Intermediate",
            Rank::Advanced => "Advanced",
            Rank::Expert => "Expert",
            Rank::PythonMaster => "Python Master",
        };
        write!(f, "{label}")
    }
}

/// Rank for a point total.
pub fn rank_for(total_points: u64) -> Rank {
    Rank::THRESHOLDS
        .iter()
        .rev()
        .find(|(low, _)| total_points >= *low)
        .map(|(_, r)| *r)
        .unwrap_or(Rank::Newbie)
}
