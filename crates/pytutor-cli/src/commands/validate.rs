//! The `pytutor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use pytutor_core::parser;

use super::{load_catalog, Globals};

pub fn execute(globals: &Globals, catalog_path: Option<PathBuf>) -> Result<()> {
    let config = globals.settings()?;

    // A directory is checked file by file so each gets its own warnings.
    let catalogs = match catalog_path.as_deref().or(config.catalog_dir.as_deref()) {
        Some(dir) if dir.is_dir() => parser::load_catalog_directory(dir)?,
        _ => vec![load_catalog(&config, catalog_path.as_deref())?],
    };
    anyhow::ensure!(!catalogs.is_empty(), "no catalog files found");

    let mut total_warnings = 0;
    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} challenges, {} lessons)",
            catalog.name,
            catalog.challenges.len(),
            catalog.lessons.len()
        );

        let warnings = parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
