//! Every built-in reference solution must earn full credit when run by the
//! real interpreter. Skips when `python3` is not installed.

use std::sync::Arc;

use pytutor_core::parser::builtin_catalog;
use pytutor_core::traits::{CodeEvaluator, EvaluateRequest};
use pytutor_core::verify::{verify_catalog, NoopProgress, VerifyConfig};
use pytutor_core::{model::Tier, scoring::assess};
use pytutor_runner::LocalRunner;

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[tokio::test]
async fn builtin_reference_solutions_get_full_credit() {
    if !python_available() {
        eprintln!("python3 not available, skipping");
        return;
    }

    let catalog = builtin_catalog().unwrap();
    let runner: Arc<dyn CodeEvaluator> = Arc::new(LocalRunner::new());
    let report = verify_catalog(&catalog, runner, &VerifyConfig::default(), &NoopProgress)
        .await
        .unwrap();

    let failures: Vec<String> = report
        .failures()
        .map(|r| format!("{}: {:?} {:?}", r.challenge_id, r.status, r.feedback))
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
    assert_eq!(report.passed(), catalog.challenges.len());
}

#[tokio::test]
async fn wrong_answers_earn_lower_tiers() {
    if !python_available() {
        eprintln!("python3 not available, skipping");
        return;
    }

    let catalog = builtin_catalog().unwrap();
    let runner = LocalRunner::new();
    let cases = [
        ("beginner_challenge_1", "print('hello, python')", Tier::Partial),
        ("beginner_challenge_2", "a = 15\nb = 7\nprint(a + b)", Tier::Missing),
        ("beginner_challenge_4", "print(total)", Tier::Consolation),
        (
            "intermediate_challenge_1",
            "def power(base, exponent=3):\n    return base ** exponent\nprint(27)\nprint(25)",
            Tier::Partial,
        ),
        ("advanced_challenge_4", "fibonacci = [0, 1, 1]", Tier::Partial),
    ];

    for (id, source, expected) in cases {
        let challenge = catalog.challenge(id).unwrap();
        let request = EvaluateRequest::new(source).with_probes(challenge.probes());
        let evaluation = runner.evaluate(&request).await.unwrap();
        let assessment = assess(challenge, &evaluation);
        assert_eq!(assessment.tier, expected, "{id}: {:?}", assessment.feedback);
        assert!(assessment.points > 0);
    }
}
