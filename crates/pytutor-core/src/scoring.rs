//! Behavioural scoring: one interpreter over every challenge's checks.
//!
//! Tier resolution, in order:
//! 1. execution failed -> consolation
//! 2. a required name was never bound -> missing
//! 3. every check passed -> full
//! 4. otherwise -> partial

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Challenge, Check, DefinedKind, Tier};
use crate::results::{Evaluation, Outcome, ProbeResult};
use crate::value::Value;

/// Tolerance used for float comparisons when a check does not set one.
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.01;

/// The graded outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub tier: Tier,
    pub points: u32,
    /// Learner-facing explanations, one per problem found.
    pub feedback: Vec<String>,
}

impl Assessment {
    pub fn is_full_credit(&self) -> bool {
        self.tier == Tier::Full
    }
}

/// Grade an evaluation against a challenge's checks.
pub fn assess(challenge: &Challenge, evaluation: &Evaluation) -> Assessment {
    let tier_of = |tier: Tier, feedback: Vec<String>| Assessment {
        tier,
        points: challenge.tiers.points(tier),
        feedback,
    };

    let (bindings, probes) = match &evaluation.outcome {
        Outcome::Failed { error } => {
            return tier_of(Tier::Consolation, vec![format!("Error: {error}")]);
        }
        Outcome::Completed { bindings, probes } => (bindings, probes),
    };

    let mut missing: Vec<&str> = Vec::new();
    for name in challenge.checks.iter().flat_map(Check::required_names) {
        if !bindings.contains_key(name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    if !missing.is_empty() {
        let feedback = missing
            .iter()
            .map(|name| format!("'{name}' was never defined"))
            .collect();
        return tier_of(Tier::Missing, feedback);
    }

    let probe_order = challenge.probes();
    let probe_for = |expression: &str| -> Option<&ProbeResult> {
        probe_order
            .iter()
            .position(|p| p == expression)
            .and_then(|idx| probes.get(idx))
    };

    let feedback: Vec<String> = challenge
        .checks
        .iter()
        .filter_map(|check| run_check(check, &evaluation.output, bindings, &probe_for).err())
        .collect();

    if feedback.is_empty() {
        tier_of(Tier::Full, Vec::new())
    } else {
        tier_of(Tier::Partial, feedback)
    }
}

/// Run one check; `Err` carries the learner-facing reason it failed.
fn run_check<'a>(
    check: &Check,
    output: &str,
    bindings: &BTreeMap<String, Value>,
    probe_for: &dyn Fn(&str) -> Option<&'a ProbeResult>,
) -> Result<(), String> {
    match check {
        Check::OutputEquals { expected } => {
            let actual = output.trim();
            if actual == expected.trim() {
                Ok(())
            } else if actual.is_empty() {
                Err(format!("Nothing was printed. Expected: {}", expected.trim()))
            } else {
                Err(format!(
                    "Your output: {actual}\nExpected: {}",
                    expected.trim()
                ))
            }
        }
        Check::OutputContains { text } => {
            if output.contains(text.as_str()) {
                Ok(())
            } else {
                Err(format!("Your output should include '{text}'"))
            }
        }
        Check::Binding {
            name,
            expected,
            tolerance,
        } => {
            let Some(actual) = bindings.get(name) else {
                return Err(format!("'{name}' was never defined"));
            };
            let tolerance = tolerance.unwrap_or(DEFAULT_FLOAT_TOLERANCE);
            if actual.matches(expected, Some(tolerance)) {
                Ok(())
            } else {
                Err(format!("'{name}' should be {expected}, not {actual}"))
            }
        }
        Check::Call {
            expression,
            expected,
            tolerance,
            ..
        } => match probe_for(expression) {
            Some(ProbeResult::Value { value }) => {
                let tolerance = tolerance.unwrap_or(DEFAULT_FLOAT_TOLERANCE);
                if value.matches(expected, Some(tolerance)) {
                    Ok(())
                } else {
                    Err(format!("{expression} should return {expected}, not {value}"))
                }
            }
            Some(ProbeResult::Error { error }) => Err(format!("{expression} raised {error}")),
            None => Err(format!("{expression} could not be evaluated")),
        },
        Check::Defined { name, kind } => {
            let Some(actual) = bindings.get(name) else {
                return Err(format!("'{name}' was never defined"));
            };
            let ok = match kind {
                DefinedKind::Function => actual.is_function(),
                DefinedKind::Class => actual.is_class(),
                DefinedKind::Any => true,
            };
            if ok {
                Ok(())
            } else {
                Err(format!(
                    "'{name}' should be a {kind}, but it is a {}",
                    actual.kind_name()
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Stage, TierTable};

    fn challenge(checks: Vec<Check>) -> Challenge {
        Challenge {
            id: "c".into(),
            stage: Stage::Intermediate,
            title: "c".into(),
            prompt: String::new(),
            checks,
            tiers: TierTable {
                full: 60,
                partial: 25,
                missing: 10,
                consolation: 10,
            },
            reference_solution: None,
            timeout_secs: None,
        }
    }

    fn bindings(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn word_counts(pairs: &[(&str, i64)]) -> Value {
        Value::Dict(
            pairs
                .iter()
                .map(|(k, v)| (Value::Str((*k).into()), Value::Int(*v)))
                .collect(),
        )
    }

    fn count_words_challenge() -> Challenge {
        challenge(vec![Check::Call {
            requires: vec!["count_words".into()],
            expression: "count_words('Hello hello world')".into(),
            expected: word_counts(&[("hello", 2), ("world", 1)]),
            tolerance: None,
        }])
    }

    fn function(name: &str) -> Value {
        Value::Function { name: name.into() }
    }

    #[test]
    fn execution_failure_is_consolation() {
        let c = count_words_challenge();
        let eval = Evaluation::failed("", "SyntaxError: invalid syntax (<learner>, line 1)");
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Consolation);
        assert_eq!(a.points, 10);
        assert!(a.feedback[0].contains("SyntaxError"));
    }

    #[test]
    fn missing_function_is_missing_tier() {
        let c = count_words_challenge();
        let eval = Evaluation::completed("", BTreeMap::new(), vec![]);
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Missing);
        assert!(a.feedback[0].contains("count_words"));
    }

    #[test]
    fn correct_mapping_is_full_credit() {
        let c = count_words_challenge();
        let eval = Evaluation::completed(
            "",
            bindings(&[("count_words", function("count_words"))]),
            vec![ProbeResult::Value {
                value: word_counts(&[("world", 1), ("hello", 2)]),
            }],
        );
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Full);
        assert_eq!(a.points, 60);
        assert!(a.feedback.is_empty());
    }

    #[test]
    fn wrong_mapping_is_partial_with_expected_and_actual() {
        let c = count_words_challenge();
        let eval = Evaluation::completed(
            "",
            bindings(&[("count_words", function("count_words"))]),
            vec![ProbeResult::Value {
                value: word_counts(&[("Hello", 1), ("hello", 1), ("world", 1)]),
            }],
        );
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Partial);
        assert_eq!(a.points, 25);
        assert!(a.feedback[0].contains("{'hello': 2, 'world': 1}"));
        assert!(a.feedback[0].contains("'Hello': 1"));
    }

    #[test]
    fn probe_error_is_partial() {
        let c = count_words_challenge();
        let eval = Evaluation::completed(
            "",
            bindings(&[("count_words", function("count_words"))]),
            vec![ProbeResult::Error {
                error: "AttributeError: 'int' object has no attribute 'split'".into(),
            }],
        );
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Partial);
        assert!(a.feedback[0].contains("AttributeError"));
    }

    #[test]
    fn wrong_result_binding_is_not_full_credit() {
        let c = challenge(vec![Check::Binding {
            name: "result".into(),
            expected: Value::Int(220),
            tolerance: None,
        }]);
        let eval = Evaluation::completed("", bindings(&[("result", Value::Int(0))]), vec![]);
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Partial);
        assert!(a.points < c.tiers.full);
        assert_eq!(a.feedback, vec!["'result' should be 220, not 0".to_string()]);
    }

    #[test]
    fn float_binding_uses_default_tolerance() {
        let c = challenge(vec![Check::Binding {
            name: "area".into(),
            expected: Value::Float(50.27),
            tolerance: None,
        }]);
        let eval =
            Evaluation::completed("", bindings(&[("area", Value::Float(50.265_44))]), vec![]);
        assert_eq!(assess(&c, &eval).tier, Tier::Full);
    }

    #[test]
    fn output_equals_trims_whitespace() {
        let c = challenge(vec![Check::OutputEquals {
            expected: "Hello, Python!".into(),
        }]);
        let ok = Evaluation::completed("Hello, Python!\n", BTreeMap::new(), vec![]);
        assert_eq!(assess(&c, &ok).tier, Tier::Full);

        let silent = Evaluation::completed("", BTreeMap::new(), vec![]);
        let a = assess(&c, &silent);
        assert_eq!(a.tier, Tier::Partial);
        assert!(a.feedback[0].contains("Nothing was printed"));
    }

    #[test]
    fn output_contains_and_bindings_combine() {
        let c = challenge(vec![
            Check::Binding {
                name: "total".into(),
                expected: Value::Int(55),
                tolerance: None,
            },
            Check::OutputContains { text: "55".into() },
        ]);
        let forgot_print = Evaluation::completed("", bindings(&[("total", Value::Int(55))]), vec![]);
        let a = assess(&c, &forgot_print);
        assert_eq!(a.tier, Tier::Partial);
        assert_eq!(a.feedback.len(), 1);

        let done = Evaluation::completed("55\n", bindings(&[("total", Value::Int(55))]), vec![]);
        assert_eq!(assess(&c, &done).tier, Tier::Full);
    }

    #[test]
    fn defined_checks_kind() {
        let c = challenge(vec![Check::Defined {
            name: "Shape".into(),
            kind: DefinedKind::Class,
        }]);
        let wrong = Evaluation::completed("", bindings(&[("Shape", Value::Int(1))]), vec![]);
        let a = assess(&c, &wrong);
        assert_eq!(a.tier, Tier::Partial);
        assert!(a.feedback[0].contains("should be a class"));

        let right = Evaluation::completed(
            "",
            bindings(&[(
                "Shape",
                Value::Class {
                    name: "Shape".into(),
                },
            )]),
            vec![],
        );
        assert_eq!(assess(&c, &right).tier, Tier::Full);
    }

    #[test]
    fn probes_are_matched_by_expression_order() {
        let c = challenge(vec![
            Check::Call {
                requires: vec!["power".into()],
                expression: "power(3, 3)".into(),
                expected: Value::Int(27),
                tolerance: None,
            },
            Check::Call {
                requires: vec!["power".into()],
                expression: "power(5)".into(),
                expected: Value::Int(25),
                tolerance: None,
            },
        ]);
        let eval = Evaluation::completed(
            "",
            bindings(&[("power", function("power"))]),
            vec![
                ProbeResult::Value {
                    value: Value::Int(27),
                },
                ProbeResult::Value {
                    value: Value::Int(10),
                },
            ],
        );
        let a = assess(&c, &eval);
        assert_eq!(a.tier, Tier::Partial);
        assert_eq!(a.feedback, vec!["power(5) should return 25, not 10".to_string()]);
    }
}
