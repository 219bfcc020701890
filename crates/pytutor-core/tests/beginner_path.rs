//! A fresh learner clears the beginner stage against the built-in catalog.

use std::collections::BTreeMap;

use pytutor_core::grader::ChallengeGrader;
use pytutor_core::mock::MockEvaluator;
use pytutor_core::model::{Stage, Tier};
use pytutor_core::parser::builtin_catalog;
use pytutor_core::progress::ProgressStore;
use pytutor_core::results::Evaluation;
use pytutor_core::value::Value;

fn ran(output: &str, bindings: &[(&str, Value)]) -> Evaluation {
    let bindings: BTreeMap<String, Value> = bindings
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Evaluation::completed(output, bindings, vec![])
}

fn beginner_evaluator() -> MockEvaluator {
    MockEvaluator::with_fixed(Evaluation::failed("", "NameError: name 'x' is not defined"))
        .respond_to("Hello", ran("Hello, Python!\n", &[]))
        .respond_to(
            "a + b",
            ran(
                "22\n",
                &[
                    ("a", Value::Int(15)),
                    ("b", Value::Int(7)),
                    ("result", Value::Int(22)),
                ],
            ),
        )
        .respond_to("% 2", ran("Even\n", &[("number", Value::Int(42))]))
        .respond_to("range(1, 11)", ran("55\n", &[("total", Value::Int(55))]))
        .respond_to(
            "remove(3)",
            ran(
                "[1, 2, 4, 5, 6]\n",
                &[(
                    "numbers",
                    Value::List([1, 2, 4, 5, 6].into_iter().map(Value::Int).collect()),
                )],
            ),
        )
}

#[tokio::test]
async fn five_beginner_challenges_unlock_mastery_once() {
    let catalog = builtin_catalog().unwrap();
    let evaluator = beginner_evaluator();
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path().join("progress.json")).unwrap();
    let mut grader = ChallengeGrader::new(&evaluator, &catalog);

    let challenges: Vec<_> = catalog.challenges_in(Stage::Beginner).collect();
    assert_eq!(challenges.len(), 5);

    let mut expected_points = 0u64;
    let mut unlocked = Vec::new();
    for challenge in &challenges {
        let source = challenge.reference_solution.as_deref().unwrap();
        let report = grader.attempt(challenge, source, &mut store).await.unwrap();
        assert_eq!(
            report.assessment.tier,
            Tier::Full,
            "{}: {:?}",
            challenge.id,
            report.assessment.feedback
        );
        expected_points += u64::from(challenge.tiers.full);
        unlocked.extend(report.unlocked);
    }

    assert_eq!(unlocked, vec!["Beginner Challenge Master".to_string()]);
    let record = store.record();
    assert_eq!(record.total_points, expected_points);
    assert_eq!(record.level as u64, expected_points / 100 + 1);
    assert_eq!(record.stage_stats(Stage::Beginner).challenges, 5);

    // A second pass adds points but never re-announces mastery.
    let first = challenges[0];
    let source = first.reference_solution.as_deref().unwrap();
    let again = grader.attempt(first, source, &mut store).await.unwrap();
    assert!(again.unlocked.is_empty());
    assert!(!again.newly_completed);
    assert_eq!(
        store.record().total_points,
        expected_points + u64::from(first.tiers.full)
    );
    assert_eq!(
        store
            .record()
            .achievements
            .iter()
            .filter(|a| *a == "Beginner Challenge Master")
            .count(),
        1
    );
}

#[tokio::test]
async fn wrong_result_is_not_full_credit() {
    let catalog = builtin_catalog().unwrap();
    let challenge = catalog.challenge("beginner_challenge_2").unwrap();
    let evaluator = MockEvaluator::with_fixed(ran(
        "0\n",
        &[
            ("a", Value::Int(15)),
            ("b", Value::Int(7)),
            ("result", Value::Int(0)),
        ],
    ));
    let dir = tempfile::tempdir().unwrap();
    let mut store = ProgressStore::open(dir.path().join("progress.json")).unwrap();
    let mut grader = ChallengeGrader::new(&evaluator, &catalog);

    let report = grader
        .attempt(challenge, "result = 0", &mut store)
        .await
        .unwrap();
    assert_eq!(report.assessment.tier, Tier::Partial);
    assert!(report.assessment.points < challenge.tiers.full);
    assert!(report.assessment.points > 0);
    assert!(!store.record().is_challenge_complete(&challenge.id));
}
