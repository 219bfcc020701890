//! The `pytutor play` command.

use anyhow::Result;
use tokio::io::{stdin, stdout, BufReader};

use pytutor_core::grader::ChallengeGrader;

use super::{load_catalog, local_runner, open_store, Globals};
use crate::session::Session;

/// Shell convention for termination by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

pub async fn execute(globals: &Globals) -> Result<()> {
    let config = globals.settings()?;
    let catalog = load_catalog(&config, None)?;
    let mut store = open_store(&config)?;
    let runner = local_runner(&config);

    if let Err(e) = runner.check_interpreter().await {
        tracing::warn!("{e:#}");
        eprintln!("Warning: {e:#}. Challenges cannot be graded until it is installed.");
    }

    let grader = ChallengeGrader::new(&runner, &catalog)
        .with_sentinel(config.sentinel.clone())
        .with_timeout(config.timeout_secs);
    let session = Session::new(
        &catalog,
        grader,
        &mut store,
        BufReader::new(stdin()),
        stdout(),
    );

    let interrupted = tokio::select! {
        result = session.run() => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    store.flush()?;
    if interrupted {
        println!("\n\nInterrupted. Your progress has been saved!");
        // The blocking stdin read cannot be cancelled, so returning would
        // leave the runtime waiting for one more line.
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }
    Ok(())
}
