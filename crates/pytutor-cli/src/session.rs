//! Interactive menu shell.
//!
//! Main menu -> stage menu -> lesson or challenge list -> attempt, always
//! returning to the list afterwards. End of input ends the session.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use pytutor_core::grader::ChallengeGrader;
use pytutor_core::leveling::{rank_for, Rank};
use pytutor_core::model::{Catalog, Stage};
use pytutor_core::progress::ProgressStore;
use pytutor_core::quiz::run_lesson;
use pytutor_report::summary::ProgressSummary;
use pytutor_report::text::render_text;

/// Whether the session should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Input ended or the learner chose to exit.
    Quit,
}

pub struct Session<'a, R, W> {
    catalog: &'a Catalog,
    grader: ChallengeGrader<'a>,
    store: &'a mut ProgressStore,
    reader: R,
    writer: W,
}

impl<'a, R, W> Session<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        catalog: &'a Catalog,
        grader: ChallengeGrader<'a>,
        store: &'a mut ProgressStore,
        reader: R,
        writer: W,
    ) -> Self {
        Self {
            catalog,
            grader,
            store,
            reader,
            writer,
        }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.say(prompt).await?;
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn pause(&mut self) -> Result<Flow> {
        Ok(match self.ask("\nPress Enter to continue...").await? {
            Some(_) => Flow::Continue,
            None => Flow::Quit,
        })
    }

    fn learner_name(&self) -> &str {
        let name = self.store.record().username.as_str();
        if name.is_empty() {
            "Student"
        } else {
            name
        }
    }

    /// Run until the learner exits or input ends.
    pub async fn run(mut self) -> Result<()> {
        if self.welcome().await? == Flow::Quit {
            return Ok(());
        }
        while self.main_menu().await? == Flow::Continue {}

        let record = self.store.record();
        let farewell = format!(
            "\nThank you for learning Python!\nKeep up the great work, {}!\nFinal Score: {} points\n",
            self.learner_name(),
            record.total_points
        );
        self.say(&farewell).await
    }

    async fn welcome(&mut self) -> Result<Flow> {
        let banner = "=".repeat(60);
        self.say(&format!(
            "{banner}\nWelcome to the Python Learning App!\nYour journey from Beginner to Python Master starts here!\n{banner}\n"
        ))
        .await?;

        if self.store.record().username.is_empty() {
            let Some(name) = self.ask("\nEnter your name to begin: ").await? else {
                return Ok(Flow::Quit);
            };
            if !name.is_empty() {
                self.store.set_username(&name)?;
            }
        }

        let record = self.store.record();
        let text = format!(
            "\nWelcome back, {}!\nCurrent Level: {}\nTotal Points: {}\nRank: {}\n",
            self.learner_name(),
            record.level,
            record.total_points,
            rank_for(record.total_points)
        );
        self.say(&text).await?;
        self.pause().await
    }

    async fn main_menu(&mut self) -> Result<Flow> {
        let banner = "=".repeat(60);
        let record = self.store.record();
        let menu = format!(
            "\n{banner}\n{:^60}\n{banner}\nPlayer: {} | Level: {} | Points: {}\nRank: {}\n{banner}\n\n\
             1. Beginner Path\n2. Intermediate Path\n3. Advanced Path\n4. View Statistics\n\
             5. How to Use This App\n0. Exit\n{banner}\n",
            "PYTHON LEARNING APP - MAIN MENU",
            self.learner_name(),
            record.level,
            record.total_points,
            rank_for(record.total_points)
        );
        self.say(&menu).await?;

        let Some(choice) = self.ask("\nSelect an option (0-5): ").await? else {
            return Ok(Flow::Quit);
        };
        match choice.as_str() {
            "1" => self.stage_menu(Stage::Beginner).await,
            "2" => self.stage_menu(Stage::Intermediate).await,
            "3" => self.stage_menu(Stage::Advanced).await,
            "4" => {
                let summary = ProgressSummary::from_record(self.store.record(), self.catalog);
                let board = format!("\n{}", render_text(&summary));
                self.say(&board).await?;
                self.pause().await
            }
            "5" => {
                let help = help_text(self.grader.sentinel());
                self.say(&help).await?;
                self.pause().await
            }
            "0" => Ok(Flow::Quit),
            _ => {
                self.say("Invalid choice. Please try again.\n").await?;
                self.pause().await
            }
        }
    }

    async fn stage_menu(&mut self, stage: Stage) -> Result<Flow> {
        self.store.set_current_stage(stage)?;
        let banner = "=".repeat(60);
        loop {
            let heading = format!("{} PATH", stage.title().to_uppercase());
            self.say(&format!(
                "\n{banner}\n{heading:^60}\n{banner}\n\n1. Lessons\n2. Challenges\n0. Back to Main Menu\n{banner}\n"
            ))
            .await?;

            let Some(choice) = self.ask("\nSelect an option (0-2): ").await? else {
                return Ok(Flow::Quit);
            };
            let flow = match choice.as_str() {
                "1" => self.lesson_menu(stage).await?,
                "2" => self.challenge_menu(stage).await?,
                "0" => return Ok(Flow::Continue),
                _ => {
                    self.say("Invalid choice. Please try again.\n").await?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
    }

    async fn lesson_menu(&mut self, stage: Stage) -> Result<Flow> {
        let catalog = self.catalog;
        let lessons: Vec<_> = catalog.lessons_in(stage).collect();
        loop {
            let mut menu = format!("\n{} LESSONS\n", stage.title().to_uppercase());
            for (i, lesson) in lessons.iter().enumerate() {
                let mark = if self.store.record().is_lesson_complete(&lesson.id) {
                    " [done]"
                } else {
                    ""
                };
                menu.push_str(&format!("{}. {}{mark}\n", i + 1, lesson.title));
            }
            menu.push_str("0. Back\n");
            self.say(&menu).await?;

            let prompt = format!("\nSelect a lesson (0-{}): ", lessons.len());
            let Some(choice) = self.ask(&prompt).await? else {
                return Ok(Flow::Quit);
            };
            if choice == "0" {
                return Ok(Flow::Continue);
            }
            let Some(lesson) = pick(&lessons, &choice) else {
                self.say("Invalid choice. Please try again.\n").await?;
                continue;
            };

            let report = run_lesson(
                lesson,
                catalog,
                &mut self.reader,
                &mut self.writer,
                self.store,
            )
            .await?;
            if report.is_none() || self.pause().await? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
    }

    async fn challenge_menu(&mut self, stage: Stage) -> Result<Flow> {
        let catalog = self.catalog;
        let challenges: Vec<_> = catalog.challenges_in(stage).collect();
        loop {
            let mut menu = format!("\n{} CHALLENGES\n", stage.title().to_uppercase());
            for (i, challenge) in challenges.iter().enumerate() {
                let mark = if self.store.record().is_challenge_complete(&challenge.id) {
                    " [done]"
                } else {
                    ""
                };
                menu.push_str(&format!("{}. {}{mark}\n", i + 1, challenge.title));
            }
            menu.push_str("0. Back\n");
            self.say(&menu).await?;

            let prompt = format!("\nSelect a challenge (0-{}): ", challenges.len());
            let Some(choice) = self.ask(&prompt).await? else {
                return Ok(Flow::Quit);
            };
            if choice == "0" {
                return Ok(Flow::Continue);
            }
            let Some(challenge) = pick(&challenges, &choice) else {
                self.say("Invalid choice. Please try again.\n").await?;
                continue;
            };

            let attempt = self
                .grader
                .run_interactive(challenge, &mut self.reader, &mut self.writer, self.store)
                .await;
            match attempt {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(Flow::Quit),
                Err(e) => {
                    tracing::error!(challenge = %challenge.id, "attempt failed: {e:#}");
                    self.say(&format!("\nError: {e:#}\nNo points were recorded.\n"))
                        .await?;
                }
            }
            if self.pause().await? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
    }
}

/// Item for a 1-based menu choice.
fn pick<'c, T>(items: &[&'c T], choice: &str) -> Option<&'c T> {
    let n: usize = choice.parse().ok()?;
    items.get(n.checked_sub(1)?).copied()
}

fn help_text(sentinel: &str) -> String {
    let banner = "=".repeat(60);
    let rule = "-".repeat(60);
    let mut text = format!(
        "\n{banner}\nHOW TO USE THIS APP\n{banner}\n\n\
         Work through the Beginner, Intermediate and Advanced paths in order.\n\
         Each path has lessons (read, then answer a short quiz) and coding\n\
         challenges (write Python that the tutor runs and checks).\n\n\
         {rule}\nTIPS FOR SUCCESS:\n{rule}\n\
         \x20 - Complete lessons before attempting challenges\n\
         \x20 - Type '{sentinel}' on its own line after your code to test it\n\
         \x20 - Wrong answers still earn a few points, so keep trying\n\
         \x20 - Your progress is saved after every attempt\n\n\
         {rule}\nSCORING SYSTEM:\n{rule}\n\
         \x20 - Full credit when every check passes; partial credit otherwise\n\
         \x20 - Level up every 100 points\n\
         \x20 - Unlock achievements for milestones\n\n\
         {rule}\nRANKS:\n{rule}\n"
    );
    for rank in Rank::all() {
        text.push_str(&format!("  {}: {rank}\n", rank.range()));
    }
    text
}
