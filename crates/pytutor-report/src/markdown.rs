//! Markdown progress report.

use crate::summary::ProgressSummary;

/// Render the summary as a Markdown document.
pub fn render_markdown(summary: &ProgressSummary) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Progress: {}\n\n", summary.display_name()));
    md.push_str(&format!(
        "**Level {}** ({}) | {} points | {} to next level | {:.1}% complete\n\n",
        summary.level,
        summary.rank,
        summary.total_points,
        summary.points_to_next_level,
        summary.completion() * 100.0
    ));

    md.push_str("## Stages\n\n");
    md.push_str("| Stage | Lessons | Challenges | Points |\n");
    md.push_str("|-------|---------|------------|--------|\n");
    for stage in &summary.stages {
        let marker = if stage.is_complete() { " ✓" } else { "" };
        md.push_str(&format!(
            "| {}{} | {}/{} | {}/{} | {} |\n",
            stage.stage.title(),
            marker,
            stage.lessons_completed,
            stage.lessons_total,
            stage.challenges_completed,
            stage.challenges_total,
            stage.points
        ));
    }
    md.push('\n');

    md.push_str("## Achievements\n\n");
    if summary.achievements.is_empty() && summary.locked_achievements.is_empty() {
        md.push_str("_None available._\n");
    }
    for label in &summary.achievements {
        md.push_str(&format!("- [x] {label}\n"));
    }
    for label in &summary.locked_achievements {
        md.push_str(&format!("- [ ] {label}\n"));
    }

    md.push_str(&format!(
        "\n_Generated {}_\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md
}
