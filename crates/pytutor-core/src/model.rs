//! Core data model types for pytutor.
//!
//! A catalog is a declarative table of challenges and lessons. Each
//! challenge carries its grading strategy (a list of [`Check`]s) and a
//! fixed [`TierTable`] of point values, so one interpreter grades every
//! challenge instead of one hand-written procedure per challenge.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::value::Value;

/// One of the three difficulty tiers that partition lessons and challenges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Beginner,
    Intermediate,
    Advanced,
}

impl Stage {
    /// All stages in learning order.
    pub const ALL: [Stage; 3] = [Stage::Beginner, Stage::Intermediate, Stage::Advanced];

    /// Capitalised label for menus and tables.
    pub fn title(self) -> &'static str {
        match self {
            Stage::Beginner => "Beginner",
            Stage::Intermediate => "Intermediate",
            Stage::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Beginner => write!(f, "beginner"),
            Stage::Intermediate => write!(f, "intermediate"),
            Stage::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Stage {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "1" => Ok(Stage::Beginner),
            "intermediate" | "2" => Ok(Stage::Intermediate),
            "advanced" | "3" => Ok(Stage::Advanced),
            other => Err(CatalogError::UnknownStage(other.to_string())),
        }
    }
}

/// What kind of value a `defined` check expects a name to be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinedKind {
    Function,
    Class,
    #[default]
    Any,
}

impl fmt::Display for DefinedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinedKind::Function => write!(f, "function"),
            DefinedKind::Class => write!(f, "class"),
            DefinedKind::Any => write!(f, "value"),
        }
    }
}

/// A single behavioural check applied after the learner's code has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Captured output, trimmed, must equal `expected` exactly.
    OutputEquals { expected: String },
    /// Captured output must contain `text`.
    OutputContains { text: String },
    /// Top-level `name` must be bound to `expected`.
    Binding {
        name: String,
        expected: Value,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    /// `expression` is evaluated in the learner's namespace and must
    /// produce `expected`. Every name in `requires` must be defined first.
    Call {
        #[serde(default)]
        requires: Vec<String>,
        expression: String,
        expected: Value,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    /// `name` must be bound to a value of the given kind.
    Defined {
        name: String,
        #[serde(rename = "is", default)]
        kind: DefinedKind,
    },
}

impl Check {
    /// Top-level names this check needs before it can be judged at all.
    pub fn required_names(&self) -> Vec<&str> {
        match self {
            Check::OutputEquals { .. } | Check::OutputContains { .. } => Vec::new(),
            Check::Binding { name, .. } | Check::Defined { name, .. } => vec![name.as_str()],
            Check::Call { requires, .. } => requires.iter().map(String::as_str).collect(),
        }
    }

    /// The probe expression this check needs evaluated, if any.
    pub fn probe(&self) -> Option<&str> {
        match self {
            Check::Call { expression, .. } => Some(expression.as_str()),
            _ => None,
        }
    }
}

/// The discrete grading outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Every check passed; the challenge is marked complete.
    Full,
    /// Code ran and defined the right shape but behaved wrongly.
    Partial,
    /// Code ran but never defined a required name.
    Missing,
    /// Code failed to execute at all.
    Consolation,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Full => write!(f, "full credit"),
            Tier::Partial => write!(f, "partial credit"),
            Tier::Missing => write!(f, "missing artifact"),
            Tier::Consolation => write!(f, "consolation"),
        }
    }
}

/// Point values for each tier, fixed per challenge in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub full: u32,
    pub partial: u32,
    pub missing: u32,
    pub consolation: u32,
}

impl TierTable {
    /// Points awarded for a tier.
    pub fn points(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Full => self.full,
            Tier::Partial => self.partial,
            Tier::Missing => self.missing,
            Tier::Consolation => self.consolation,
        }
    }

    /// `full > partial >= missing >= consolation > 0`.
    pub fn is_well_ordered(&self) -> bool {
        self.consolation > 0
            && self.missing >= self.consolation
            && self.partial >= self.missing
            && self.full > self.partial
    }
}

/// A coding challenge definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier, e.g. `beginner_challenge_1`.
    pub id: String,
    /// Stage the challenge belongs to.
    pub stage: Stage,
    /// Human-readable title.
    pub title: String,
    /// Task statement shown before collecting code.
    pub prompt: String,
    /// Grading strategy.
    pub checks: Vec<Check>,
    /// Point values per outcome.
    pub tiers: TierTable,
    /// Known-good solution used by `pytutor verify`.
    #[serde(default)]
    pub reference_solution: Option<String>,
    /// Per-challenge timeout override in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Challenge {
    /// Probe expressions in check order, deduplicated.
    pub fn probes(&self) -> Vec<String> {
        let mut probes: Vec<String> = Vec::new();
        for probe in self.checks.iter().filter_map(Check::probe) {
            if !probes.iter().any(|p| p == probe) {
                probes.push(probe.to_string());
            }
        }
        probes
    }
}

/// One multiple-choice quiz question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<String>,
    /// 1-based index of the correct choice.
    pub answer: usize,
    pub correct_points: u32,
    pub incorrect_points: u32,
    #[serde(default)]
    pub explanation: String,
}

/// A lesson: explanatory text followed by a short quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub stage: Stage,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub questions: Vec<Question>,
    /// Achievement unlocked when every question is answered correctly.
    #[serde(default)]
    pub perfect_achievement: Option<String>,
}

impl Lesson {
    /// Highest score reachable on this lesson's quiz.
    pub fn max_points(&self) -> u32 {
        self.questions.iter().map(|q| q.correct_points).sum()
    }
}

/// An achievement unlocked once a completion count reaches a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRule {
    pub achievement: String,
    /// Defaults to "everything in scope".
    #[serde(default)]
    pub threshold: Option<usize>,
}

/// Achievement rules for one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRules {
    #[serde(default)]
    pub challenge_mastery: Option<MasteryRule>,
    #[serde(default)]
    pub lesson_mastery: Option<MasteryRule>,
}

/// A complete set of challenges, lessons, and achievement rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default)]
    pub stages: BTreeMap<Stage, StageRules>,
    /// Global achievement across all stages.
    #[serde(default)]
    pub capstone: Option<MasteryRule>,
}

impl Catalog {
    pub fn challenge(&self, id: &str) -> Result<&Challenge, CatalogError> {
        self.challenges
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::UnknownChallenge(id.to_string()))
    }

    pub fn lesson(&self, id: &str) -> Result<&Lesson, CatalogError> {
        self.lessons
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| CatalogError::UnknownLesson(id.to_string()))
    }

    pub fn challenges_in(&self, stage: Stage) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(move |c| c.stage == stage)
    }

    pub fn lessons_in(&self, stage: Stage) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter().filter(move |l| l.stage == stage)
    }

    /// Stage-mastery rule with its effective threshold.
    pub fn challenge_mastery(&self, stage: Stage) -> Option<(&str, usize)> {
        let rule = self.stages.get(&stage)?.challenge_mastery.as_ref()?;
        let threshold = rule
            .threshold
            .unwrap_or_else(|| self.challenges_in(stage).count());
        Some((rule.achievement.as_str(), threshold))
    }

    /// Lesson-mastery rule with its effective threshold.
    pub fn lesson_mastery(&self, stage: Stage) -> Option<(&str, usize)> {
        let rule = self.stages.get(&stage)?.lesson_mastery.as_ref()?;
        let threshold = rule
            .threshold
            .unwrap_or_else(|| self.lessons_in(stage).count());
        Some((rule.achievement.as_str(), threshold))
    }

    /// Capstone rule with its effective threshold.
    pub fn capstone(&self) -> Option<(&str, usize)> {
        let rule = self.capstone.as_ref()?;
        let threshold = rule.threshold.unwrap_or(self.challenges.len());
        Some((rule.achievement.as_str(), threshold))
    }

    /// Fold another catalog into this one. Later rules override earlier ones.
    pub fn merge(&mut self, other: Catalog) {
        self.challenges.extend(other.challenges);
        self.lessons.extend(other.lessons);
        for (stage, rules) in other.stages {
            let entry = self.stages.entry(stage).or_default();
            if rules.challenge_mastery.is_some() {
                entry.challenge_mastery = rules.challenge_mastery;
            }
            if rules.lesson_mastery.is_some() {
                entry.lesson_mastery = rules.lesson_mastery;
            }
        }
        if other.capstone.is_some() {
            self.capstone = other.capstone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TierTable {
        TierTable {
            full: 40,
            partial: 15,
            missing: 10,
            consolation: 5,
        }
    }

    fn challenge(id: &str, stage: Stage) -> Challenge {
        Challenge {
            id: id.into(),
            stage,
            title: id.into(),
            prompt: String::new(),
            checks: vec![],
            tiers: tiers(),
            reference_solution: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn stage_display_and_parse() {
        assert_eq!(Stage::Beginner.to_string(), "beginner");
        assert_eq!("Advanced".parse::<Stage>().unwrap(), Stage::Advanced);
        assert_eq!("2".parse::<Stage>().unwrap(), Stage::Intermediate);
        assert!("expert".parse::<Stage>().is_err());
    }

    #[test]
    fn tier_table_points_and_ordering() {
        let t = tiers();
        assert_eq!(t.points(Tier::Full), 40);
        assert_eq!(t.points(Tier::Consolation), 5);
        assert!(t.is_well_ordered());

        let flat = TierTable {
            full: 10,
            partial: 10,
            missing: 5,
            consolation: 5,
        };
        assert!(!flat.is_well_ordered());

        let zero = TierTable {
            consolation: 0,
            ..t
        };
        assert!(!zero.is_well_ordered());
    }

    #[test]
    fn check_required_names_and_probes() {
        let call = Check::Call {
            requires: vec!["power".into()],
            expression: "power(3, 3)".into(),
            expected: Value::Int(27),
            tolerance: None,
        };
        assert_eq!(call.required_names(), vec!["power"]);
        assert_eq!(call.probe(), Some("power(3, 3)"));

        let out = Check::OutputContains { text: "27".into() };
        assert!(out.required_names().is_empty());
        assert!(out.probe().is_none());
    }

    #[test]
    fn challenge_probes_are_deduplicated() {
        let mut c = challenge("c", Stage::Beginner);
        let call = Check::Call {
            requires: vec![],
            expression: "f()".into(),
            expected: Value::Int(1),
            tolerance: None,
        };
        c.checks = vec![call.clone(), call];
        assert_eq!(c.probes(), vec!["f()".to_string()]);
    }

    #[test]
    fn mastery_threshold_defaults_to_stage_size() {
        let mut catalog = Catalog {
            challenges: vec![
                challenge("a", Stage::Beginner),
                challenge("b", Stage::Beginner),
                challenge("c", Stage::Advanced),
            ],
            ..Default::default()
        };
        catalog.stages.insert(
            Stage::Beginner,
            StageRules {
                challenge_mastery: Some(MasteryRule {
                    achievement: "Beginner Master".into(),
                    threshold: None,
                }),
                lesson_mastery: None,
            },
        );
        catalog.capstone = Some(MasteryRule {
            achievement: "Champion".into(),
            threshold: None,
        });

        assert_eq!(
            catalog.challenge_mastery(Stage::Beginner),
            Some(("Beginner Master", 2))
        );
        assert_eq!(catalog.challenge_mastery(Stage::Advanced), None);
        assert_eq!(catalog.capstone(), Some(("Champion", 3)));
    }

    #[test]
    fn unknown_challenge_lookup_fails() {
        let catalog = Catalog::default();
        assert!(matches!(
            catalog.challenge("nope"),
            Err(CatalogError::UnknownChallenge(_))
        ));
    }

    #[test]
    fn merge_overrides_rules() {
        let mut base = Catalog {
            challenges: vec![challenge("a", Stage::Beginner)],
            ..Default::default()
        };
        let other = Catalog {
            challenges: vec![challenge("b", Stage::Beginner)],
            capstone: Some(MasteryRule {
                achievement: "New".into(),
                threshold: Some(1),
            }),
            ..Default::default()
        };
        base.merge(other);
        assert_eq!(base.challenges.len(), 2);
        assert_eq!(base.capstone(), Some(("New", 1)));
    }
}
