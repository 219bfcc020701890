//! The `pytutor grade` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use pytutor_core::grader::{render_feedback, ChallengeGrader};
use pytutor_core::model::Tier;

use super::{load_catalog, local_runner, open_store, Globals};

pub async fn execute(
    globals: &Globals,
    challenge_id: String,
    file: PathBuf,
    dry_run: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        format == "text" || format == "json",
        "unknown format '{format}' (expected text or json)"
    );

    let config = globals.settings()?;
    let catalog = load_catalog(&config, None)?;
    let challenge = catalog.challenge(&challenge_id)?;
    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let runner = local_runner(&config);
    let mut grader = ChallengeGrader::new(&runner, &catalog).with_timeout(config.timeout_secs);

    if dry_run {
        let (evaluation, assessment) = grader.evaluate(challenge, &source).await?;
        if format == "json" {
            let json = serde_json::json!({
                "challenge_id": challenge.id,
                "assessment": assessment,
                "evaluation": evaluation,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        } else {
            println!("{}: {} ({} points)", challenge.title, assessment.tier, assessment.points);
            if assessment.tier != Tier::Full {
                for line in &assessment.feedback {
                    println!("  - {line}");
                }
            }
        }
        return Ok(());
    }

    let mut store = open_store(&config)?;
    let report = grader.attempt(challenge, &source, &mut store).await?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", challenge.title);
        print!("{}", render_feedback(&report));
        println!(
            "\nTotal: {} points (level {})",
            store.record().total_points,
            store.record().level
        );
    }
    Ok(())
}
