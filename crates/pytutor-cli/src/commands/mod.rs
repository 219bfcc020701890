//! Subcommand implementations and the setup they share.

pub mod grade;
pub mod init;
pub mod list;
pub mod play;
pub mod stats;
pub mod validate;
pub mod verify;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use pytutor_core::config::{load_config_from, TutorConfig};
use pytutor_core::model::Catalog;
use pytutor_core::parser;
use pytutor_core::progress::ProgressStore;
use pytutor_runner::LocalRunner;

/// Options accepted by every subcommand.
pub struct Globals {
    pub config: Option<PathBuf>,
    pub progress: Option<PathBuf>,
}

impl Globals {
    /// Load the config file and apply `--progress`.
    pub fn settings(&self) -> Result<TutorConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(path) = &self.progress {
            config.progress_file = path.clone();
        }
        Ok(config)
    }
}

/// The catalog named on the command line, else the configured one, else
/// the built-in catalog.
pub fn load_catalog(config: &TutorConfig, explicit: Option<&Path>) -> Result<Catalog> {
    let path = explicit.or(config.catalog_dir.as_deref());
    if let Some(p) = path {
        tracing::debug!("loading catalog from {}", p.display());
    }
    parser::load_catalog(path)
}

pub fn open_store(config: &TutorConfig) -> Result<ProgressStore> {
    ProgressStore::open(config.progress_file.clone()).with_context(|| {
        format!(
            "could not open progress file {}",
            config.progress_file.display()
        )
    })
}

pub fn local_runner(config: &TutorConfig) -> LocalRunner {
    LocalRunner::new()
        .with_interpreter(config.interpreter.clone())
        .with_timeout(Duration::from_secs(config.timeout_secs))
}
