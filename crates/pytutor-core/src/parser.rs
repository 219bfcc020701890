//! TOML catalog parser.
//!
//! Loads challenge and lesson catalogs from TOML files and directories,
//! ships the built-in catalog, and validates catalogs for common mistakes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Catalog, Challenge, Check, DefinedKind, Lesson, MasteryRule, Question, Stage, StageRules,
    TierTable,
};
use crate::value::Value;

const BUILTIN_CATALOGS: [(&str, &str); 3] = [
    ("beginner.toml", include_str!("../catalog/beginner.toml")),
    ("intermediate.toml", include_str!("../catalog/intermediate.toml")),
    ("advanced.toml", include_str!("../catalog/advanced.toml")),
];

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    challenges: Vec<TomlChallenge>,
    #[serde(default)]
    lessons: Vec<TomlLesson>,
    #[serde(default)]
    stages: BTreeMap<String, TomlStageRules>,
    #[serde(default)]
    capstone: Option<MasteryRule>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    /// Stage for entries that do not name one.
    #[serde(default)]
    default_stage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlChallenge {
    id: String,
    #[serde(default)]
    stage: Option<String>,
    title: String,
    prompt: String,
    #[serde(default)]
    checks: Vec<TomlCheck>,
    tiers: TierTable,
    #[serde(default)]
    reference_solution: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TomlCheck {
    OutputEquals {
        expected: String,
    },
    OutputContains {
        text: String,
    },
    Binding {
        name: String,
        expected: serde_json::Value,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    Call {
        #[serde(default)]
        requires: Vec<String>,
        expression: String,
        expected: serde_json::Value,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    Defined {
        name: String,
        #[serde(rename = "is", default)]
        kind: DefinedKind,
    },
}

#[derive(Debug, Deserialize)]
struct TomlLesson {
    id: String,
    #[serde(default)]
    stage: Option<String>,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default = "default_correct_points")]
    correct_points: u32,
    #[serde(default = "default_incorrect_points")]
    incorrect_points: u32,
    #[serde(default)]
    perfect_achievement: Option<String>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

fn default_correct_points() -> u32 {
    10
}

fn default_incorrect_points() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    prompt: String,
    choices: Vec<String>,
    answer: usize,
    #[serde(default)]
    correct_points: Option<u32>,
    #[serde(default)]
    incorrect_points: Option<u32>,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Default, Deserialize)]
struct TomlStageRules {
    #[serde(default)]
    challenge_mastery: Option<MasteryRule>,
    #[serde(default)]
    lesson_mastery: Option<MasteryRule>,
}

fn resolve_stage(stage: Option<&str>, default: Option<Stage>, id: &str) -> Result<Stage> {
    match stage {
        Some(s) => s
            .parse::<Stage>()
            .with_context(|| format!("invalid stage for '{id}'")),
        None => default.with_context(|| {
            format!("'{id}' has no stage and the catalog sets no default_stage")
        }),
    }
}

fn convert_check(check: TomlCheck, challenge_id: &str) -> Result<Check> {
    let literal = |json: &serde_json::Value| {
        Value::from_json(json)
            .with_context(|| format!("invalid expected value in challenge '{challenge_id}'"))
    };
    Ok(match check {
        TomlCheck::OutputEquals { expected } => Check::OutputEquals { expected },
        TomlCheck::OutputContains { text } => Check::OutputContains { text },
        TomlCheck::Binding {
            name,
            expected,
            tolerance,
        } => Check::Binding {
            name,
            expected: literal(&expected)?,
            tolerance,
        },
        TomlCheck::Call {
            requires,
            expression,
            expected,
            tolerance,
        } => Check::Call {
            requires,
            expression,
            expected: literal(&expected)?,
            tolerance,
        },
        TomlCheck::Defined { name, kind } => Check::Defined { name, kind },
    })
}

/// Parse a single TOML catalog file.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_stage = parsed
        .catalog
        .default_stage
        .as_deref()
        .map(str::parse::<Stage>)
        .transpose()
        .context("invalid default_stage")?;

    let challenges = parsed
        .challenges
        .into_iter()
        .map(|c| {
            let stage = resolve_stage(c.stage.as_deref(), default_stage, &c.id)?;
            let checks = c
                .checks
                .into_iter()
                .map(|check| convert_check(check, &c.id))
                .collect::<Result<Vec<_>>>()?;
            Ok(Challenge {
                id: c.id,
                stage,
                title: c.title,
                prompt: c.prompt,
                checks,
                tiers: c.tiers,
                reference_solution: c.reference_solution,
                timeout_secs: c.timeout_secs,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let lessons = parsed
        .lessons
        .into_iter()
        .map(|l| {
            let stage = resolve_stage(l.stage.as_deref(), default_stage, &l.id)?;
            let questions = l
                .questions
                .into_iter()
                .map(|q| Question {
                    prompt: q.prompt,
                    choices: q.choices,
                    answer: q.answer,
                    correct_points: q.correct_points.unwrap_or(l.correct_points),
                    incorrect_points: q.incorrect_points.unwrap_or(l.incorrect_points),
                    explanation: q.explanation,
                })
                .collect();
            Ok(Lesson {
                id: l.id,
                stage,
                title: l.title,
                body: l.body,
                questions,
                perfect_achievement: l.perfect_achievement,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let stages = parsed
        .stages
        .into_iter()
        .map(|(name, rules)| {
            let stage: Stage = name
                .parse()
                .with_context(|| format!("invalid stage table [stages.{name}]"))?;
            Ok((
                stage,
                StageRules {
                    challenge_mastery: rules.challenge_mastery,
                    lesson_mastery: rules.lesson_mastery,
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(Catalog {
        id: parsed.catalog.id,
        name: parsed.catalog.name,
        description: parsed.catalog.description,
        challenges,
        lessons,
        stages,
        capstone: parsed.capstone,
    })
}

/// Recursively load all `.toml` catalog files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// The catalog compiled into the binary.
pub fn builtin_catalog() -> Result<Catalog> {
    let mut merged: Option<Catalog> = None;
    for (name, content) in BUILTIN_CATALOGS {
        let catalog = parse_catalog_str(content, Path::new(name))?;
        match merged.as_mut() {
            Some(base) => base.merge(catalog),
            None => merged = Some(catalog),
        }
    }
    let mut catalog = merged.context("no built-in catalog files")?;
    catalog.id = "builtin".into();
    catalog.name = "Python Learning Adventure".into();
    Ok(catalog)
}

/// Load the catalog at `path` (a file or a directory), or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(path) = path else {
        return builtin_catalog();
    };
    if !path.is_dir() {
        return parse_catalog(path);
    }

    let mut catalogs = load_catalog_directory(path)?.into_iter();
    let mut merged = catalogs
        .next()
        .with_context(|| format!("no catalog files found in {}", path.display()))?;
    for catalog in catalogs {
        merged.merge(catalog);
    }
    Ok(merged)
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The challenge or lesson ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.item_id {
            Some(id) => write!(f, "[{id}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Validate a catalog for common issues.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: &str, message: String| {
        warnings.push(ValidationWarning {
            item_id: Some(id.to_string()),
            message,
        });
    };

    let mut seen = HashSet::new();
    for challenge in &catalog.challenges {
        if !seen.insert(challenge.id.as_str()) {
            warn(&challenge.id, format!("duplicate challenge ID: {}", challenge.id));
        }
    }
    let mut seen = HashSet::new();
    for lesson in &catalog.lessons {
        if !seen.insert(lesson.id.as_str()) {
            warn(&lesson.id, format!("duplicate lesson ID: {}", lesson.id));
        }
    }

    for challenge in &catalog.challenges {
        let id = challenge.id.as_str();
        if challenge.prompt.trim().is_empty() {
            warn(id, "prompt is empty".into());
        }
        if challenge.checks.is_empty() {
            warn(id, "no checks: every attempt would earn full credit".into());
        }
        if !challenge.tiers.is_well_ordered() {
            let t = challenge.tiers;
            warn(
                id,
                format!(
                    "tiers must satisfy full > partial >= missing >= consolation > 0 (got {}/{}/{}/{})",
                    t.full, t.partial, t.missing, t.consolation
                ),
            );
        }
        if challenge.reference_solution.is_none() {
            warn(id, "no reference_solution; `pytutor verify` cannot check it".into());
        }
        for check in &challenge.checks {
            match check {
                Check::Call {
                    requires,
                    expression,
                    ..
                } if requires.is_empty() => warn(
                    id,
                    format!("call check `{expression}` has no `requires`; a missing definition scores as partial"),
                ),
                Check::Binding {
                    tolerance: Some(t), ..
                }
                | Check::Call {
                    tolerance: Some(t), ..
                } if *t < 0.0 => warn(id, format!("negative tolerance {t}")),
                _ => {}
            }
        }
    }

    for lesson in &catalog.lessons {
        let id = lesson.id.as_str();
        if lesson.questions.is_empty() {
            warn(id, "lesson has no questions".into());
        }
        for (n, question) in lesson.questions.iter().enumerate() {
            if question.choices.len() < 2 {
                warn(id, format!("question {} has fewer than two choices", n + 1));
            }
            if question.answer == 0 || question.answer > question.choices.len() {
                warn(
                    id,
                    format!(
                        "question {} answer {} is out of range 1-{}",
                        n + 1,
                        question.answer,
                        question.choices.len()
                    ),
                );
            }
            if question.incorrect_points > question.correct_points {
                warn(
                    id,
                    format!("question {} pays more for a wrong answer", n + 1),
                );
            }
        }
    }

    for stage in Stage::ALL {
        if let Some((label, threshold)) = catalog.challenge_mastery(stage) {
            let available = catalog.challenges_in(stage).count();
            if threshold > available {
                warnings.push(ValidationWarning {
                    item_id: None,
                    message: format!(
                        "'{label}' needs {threshold} {stage} challenges but only {available} exist"
                    ),
                });
            }
        }
        if let Some((label, threshold)) = catalog.lesson_mastery(stage) {
            let available = catalog.lessons_in(stage).count();
            if threshold > available {
                warnings.push(ValidationWarning {
                    item_id: None,
                    message: format!(
                        "'{label}' needs {threshold} {stage} lessons but only {available} exist"
                    ),
                });
            }
        }
    }

    warnings
}
