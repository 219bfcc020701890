//! The `pytutor stats` command.

use std::path::PathBuf;

use anyhow::Result;

use pytutor_report::{render, write_report, Format, ProgressSummary};

use super::{load_catalog, open_store, Globals};

pub fn execute(globals: &Globals, format: String, output: Option<PathBuf>) -> Result<()> {
    let format: Format = format.parse()?;
    let config = globals.settings()?;
    let catalog = load_catalog(&config, None)?;
    let store = open_store(&config)?;
    let summary = ProgressSummary::from_record(store.record(), &catalog);

    match output {
        Some(path) => {
            write_report(&summary, format, &path)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => print!("{}", render(&summary, format)?),
    }
    Ok(())
}
