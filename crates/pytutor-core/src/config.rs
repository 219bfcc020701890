//! Tutor configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level pytutor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Where the progress record is saved.
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    /// Python interpreter used to run learner code.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Execution timeout for one attempt, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Line that ends code entry.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
    /// Catalog file or directory replacing the built-in catalog.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
    /// Max concurrent evaluations for `pytutor verify`.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_progress_file() -> PathBuf {
    std::env::var("HOME")
        .map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("pytutor")
        })
        .unwrap_or_else(|_| PathBuf::from(".pytutor"))
        .join("progress.json")
}
fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_sentinel() -> String {
    "RUN".to_string()
}
fn default_parallelism() -> usize {
    4
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            progress_file: default_progress_file(),
            interpreter: default_interpreter(),
            timeout_secs: default_timeout(),
            sentinel: default_sentinel(),
            catalog_dir: None,
            parallelism: default_parallelism(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = lookup(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path, lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy(), lookup))
}

impl TutorConfig {
    /// Apply `PYTUTOR_PROGRESS` / `PYTUTOR_PYTHON` overrides and expand
    /// `${VAR}` references in paths.
    fn apply_env(mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("PYTUTOR_PROGRESS").filter(|p| !p.is_empty()) {
            self.progress_file = PathBuf::from(path);
        }
        if let Some(python) = lookup("PYTUTOR_PYTHON").filter(|p| !p.is_empty()) {
            self.interpreter = python;
        }
        self.progress_file = resolve_path(&self.progress_file, lookup);
        self.catalog_dir = self.catalog_dir.map(|dir| resolve_path(&dir, lookup));
        self
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `pytutor.toml` in the current directory
/// 2. `~/.config/pytutor/config.toml`
///
/// Environment variable overrides: `PYTUTOR_PROGRESS`, `PYTUTOR_PYTHON`.
pub fn load_config() -> Result<TutorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TutorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("pytutor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(
                &std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?,
            )
            .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TutorConfig::default(),
    };

    Ok(config.apply_env(&|name: &str| std::env::var(name).ok()))
}

/// Parse config text without touching the environment.
pub fn parse_config(content: &str) -> Result<TutorConfig> {
    let config: TutorConfig = toml::from_str(content)?;
    if config.parallelism == 0 {
        anyhow::bail!("parallelism must be at least 1");
    }
    if config.timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be at least 1");
    }
    if config.sentinel.trim().is_empty() {
        anyhow::bail!("sentinel must not be blank");
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pytutor"))
}

/// Starter config written by `pytutor init`.
pub fn sample_config() -> String {
    r#"# pytutor configuration
#
# Search order: ./pytutor.toml, then ~/.config/pytutor/config.toml.
# PYTUTOR_PROGRESS and PYTUTOR_PYTHON override the matching fields.

# progress_file = "${HOME}/.local/share/pytutor/progress.json"
interpreter = "python3"
timeout_secs = 10
sentinel = "RUN"
parallelism = 4

# Replace the built-in catalog with your own file or directory:
# catalog_dir = "./catalog"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("DATA", "/srv")]);
        assert_eq!(resolve_env_vars("${DATA}", &lookup), "/srv");
        assert_eq!(
            resolve_env_vars("${DATA}/pytutor/${MISSING}x", &lookup),
            "/srv/pytutor/x"
        );
        assert_eq!(resolve_env_vars("${unterminated", &lookup), "${unterminated");
    }

    #[test]
    fn default_config() {
        let config = TutorConfig::default();
        assert_eq!(config.interpreter, "python3");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.sentinel, "RUN");
        assert!(config.progress_file.ends_with("progress.json"));
    }

    #[test]
    fn parse_partial_config() {
        let config = parse_config(
            r#"
interpreter = "python3.12"
catalog_dir = "${ROOT}/catalog"
"#,
        )
        .unwrap();
        assert_eq!(config.interpreter, "python3.12");
        assert_eq!(config.sentinel, "RUN");

        let config = config.apply_env(&env(&[("ROOT", "/opt/course")]));
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/opt/course/catalog")));
    }

    #[test]
    fn env_overrides_win() {
        let config = TutorConfig::default().apply_env(&env(&[
            ("PYTUTOR_PROGRESS", "/tmp/save.json"),
            ("PYTUTOR_PYTHON", "/usr/bin/python3"),
        ]));
        assert_eq!(config.progress_file, PathBuf::from("/tmp/save.json"));
        assert_eq!(config.interpreter, "/usr/bin/python3");
    }

    #[test]
    fn zero_parallelism_rejected() {
        assert!(parse_config("parallelism = 0").is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = parse_config("timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn blank_sentinel_rejected() {
        assert!(parse_config("sentinel = \"\"").is_err());
        let err = parse_config("sentinel = \"   \"").unwrap_err();
        assert!(err.to_string().contains("sentinel"));
    }

    #[test]
    fn sample_config_parses() {
        let config = parse_config(&sample_config()).unwrap();
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn missing_explicit_path_fails() {
        assert!(load_config_from(Some(Path::new("/nonexistent/pytutor.toml"))).is_err());
    }
}
