//! Terminal stats board.

use comfy_table::{Cell, Table};

use crate::summary::ProgressSummary;

/// Render the summary as a plain-text board with a per-stage table.
pub fn render_text(summary: &ProgressSummary) -> String {
    let mut out = String::new();
    let banner = "=".repeat(60);

    out.push_str(&format!(
        "{banner}\nPROGRESS FOR {}\n{banner}\n",
        summary.display_name().to_uppercase()
    ));
    out.push_str(&format!(
        "Level:          {} ({})\n",
        summary.level, summary.rank
    ));
    out.push_str(&format!("Total points:   {}\n", summary.total_points));
    out.push_str(&format!(
        "Next level in:  {} points\n",
        summary.points_to_next_level
    ));
    out.push_str(&format!("Current stage:  {}\n", summary.current_stage.title()));
    out.push_str(&format!(
        "Completion:     {:.1}%\n",
        summary.completion() * 100.0
    ));
    if let Some(last) = summary.last_played {
        out.push_str(&format!("Last played:    {}\n", last.format("%Y-%m-%d %H:%M")));
    }
    out.push('\n');

    let mut table = Table::new();
    table.set_header(vec!["Stage", "Lessons", "Challenges", "Points"]);
    for stage in &summary.stages {
        table.add_row(vec![
            Cell::new(stage.stage.title()),
            Cell::new(format!("{}/{}", stage.lessons_completed, stage.lessons_total)),
            Cell::new(format!(
                "{}/{}",
                stage.challenges_completed, stage.challenges_total
            )),
            Cell::new(stage.points),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    out.push_str(&format!("\nAchievements ({}):\n", summary.achievements.len()));
    if summary.achievements.is_empty() {
        out.push_str("  none yet\n");
    }
    for label in &summary.achievements {
        out.push_str(&format!("  * {label}\n"));
    }
    if !summary.locked_achievements.is_empty() {
        out.push_str(&format!("\nLocked ({}):\n", summary.locked_achievements.len()));
        for label in &summary.locked_achievements {
            out.push_str(&format!("  - {label}\n"));
        }
    }
    out
}
