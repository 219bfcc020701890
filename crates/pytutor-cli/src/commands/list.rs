//! The `pytutor list` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use pytutor_core::model::Stage;

use super::{load_catalog, open_store, Globals};

pub fn execute(globals: &Globals, stage: Option<String>) -> Result<()> {
    let stages: Vec<Stage> = match stage {
        Some(s) => vec![s.parse::<Stage>()?],
        None => Stage::ALL.to_vec(),
    };

    let config = globals.settings()?;
    let catalog = load_catalog(&config, None)?;
    let store = open_store(&config)?;
    let record = store.record();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Stage", "Type", "Title", "Points", "Done"]);

    let done = |complete: bool| if complete { "yes" } else { "" };
    for &stage in &stages {
        for lesson in catalog.lessons_in(stage) {
            table.add_row(vec![
                Cell::new(&lesson.id),
                Cell::new(stage),
                Cell::new("lesson"),
                Cell::new(&lesson.title),
                Cell::new(lesson.max_points()),
                Cell::new(done(record.is_lesson_complete(&lesson.id))),
            ]);
        }
        for challenge in catalog.challenges_in(stage) {
            table.add_row(vec![
                Cell::new(&challenge.id),
                Cell::new(stage),
                Cell::new("challenge"),
                Cell::new(&challenge.title),
                Cell::new(challenge.tiers.full),
                Cell::new(done(record.is_challenge_complete(&challenge.id))),
            ]);
        }
    }

    println!("{} ({})", catalog.name, catalog.id);
    println!("{table}");
    Ok(())
}
