//! Lesson runner: show the lesson text, ask its quiz, record the score.

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::achievements;
use crate::model::{Catalog, Lesson, Question};
use crate::progress::ProgressStore;

/// Outcome of one completed lesson.
#[derive(Debug, Clone, Serialize)]
pub struct LessonReport {
    pub lesson_id: String,
    pub points: u32,
    pub correct: usize,
    pub total: usize,
    pub newly_completed: bool,
    pub level_before: u32,
    pub level_after: u32,
    pub unlocked: Vec<String>,
}

impl LessonReport {
    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = String::new();
    if reader.read_line(&mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// Points for one answer, and whether it was right.
pub fn score_answer(question: &Question, answer: &str) -> (bool, u32) {
    let right = answer.trim().parse::<usize>().ok() == Some(question.answer);
    if right {
        (true, question.correct_points)
    } else {
        (false, question.incorrect_points)
    }
}

/// Run `lesson` interactively.
///
/// Nothing is recorded unless every question gets an answer; `None` means
/// input ended first.
pub async fn run_lesson<R, W>(
    lesson: &Lesson,
    catalog: &Catalog,
    reader: &mut R,
    writer: &mut W,
    store: &mut ProgressStore,
) -> Result<Option<LessonReport>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let banner = "=".repeat(60);
    let intro = format!(
        "\n{banner}\n{}\n{banner}\n\n{}\n",
        lesson.title,
        lesson.body.trim_end()
    );
    writer.write_all(intro.as_bytes()).await?;
    writer.write_all(b"\nPress Enter to continue...\n").await?;
    writer.flush().await?;
    if read_line(reader).await?.is_none() {
        return Ok(None);
    }

    let rule = "-".repeat(60);
    writer
        .write_all(format!("\n{rule}\nQUIZ TIME!\n{rule}\n").as_bytes())
        .await?;

    let mut points = 0u32;
    let mut correct = 0usize;
    for (number, question) in lesson.questions.iter().enumerate() {
        let mut text = format!("\nQ{}: {}\n", number + 1, question.prompt);
        for (i, choice) in question.choices.iter().enumerate() {
            text.push_str(&format!("  {}. {choice}\n", i + 1));
        }
        text.push_str(&format!("\nYour answer (1-{}): ", question.choices.len()));
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;

        let Some(answer) = read_line(reader).await? else {
            tracing::debug!(lesson = %lesson.id, "input ended during quiz");
            return Ok(None);
        };

        let (right, earned) = score_answer(question, &answer);
        points += earned;
        let mut reply = if right {
            correct += 1;
            "Correct!".to_string()
        } else {
            format!("Incorrect. The correct answer is {}.", question.answer)
        };
        if !question.explanation.is_empty() {
            reply.push(' ');
            reply.push_str(&question.explanation);
        }
        writer.write_all(format!("{reply}\n").as_bytes()).await?;
    }

    let change = store.add_points(points, lesson.stage)?;
    let newly_completed = store.mark_lesson_complete(&lesson.id, lesson.stage)?;

    let mut unlocked = Vec::new();
    let total = lesson.questions.len();
    if correct == total {
        if let Some(label) = &lesson.perfect_achievement {
            if store.unlock_achievement(label)? {
                unlocked.push(label.clone());
            }
        }
    }
    if let Some(label) = achievements::due_after_lesson(store.record(), catalog, lesson.stage) {
        if store.unlock_achievement(&label)? {
            unlocked.push(label);
        }
    }
    tracing::info!(lesson = %lesson.id, points, correct, total, "lesson finished");

    let mut summary = format!("\nLesson Complete! You earned {points} points!\n");
    if change.leveled_up() {
        summary.push_str(&format!("\nLEVEL UP! You are now level {}!\n", change.to));
    }
    for label in &unlocked {
        summary.push_str(&format!("\nACHIEVEMENT UNLOCKED: {label}\n"));
    }
    writer.write_all(summary.as_bytes()).await?;
    writer.flush().await?;

    Ok(Some(LessonReport {
        lesson_id: lesson.id.clone(),
        points,
        correct,
        total,
        newly_completed,
        level_before: change.from,
        level_after: change.to,
        unlocked,
    }))
}
