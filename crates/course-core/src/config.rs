use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CourseError, Result};
use crate::runner::DEFAULT_RUNNER_COMMAND;

const CONFIG_FILE: &str = "course.toml";

/// Tool configuration, read from `course.toml` at the repository root.
/// A missing file means defaults; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Expectations about the shared course repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamConfig {
    /// Fetch URL the `upstream` remote must point to. Unset means `sync`
    /// only checks that the remote exists.
    pub url: Option<String>,
}

/// External test-harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Command that runs a chapter's tests.html and prints a JSON report.
    #[serde(default = "default_runner_command")]
    pub command: String,
}

fn default_runner_command() -> String {
    DEFAULT_RUNNER_COMMAND.to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
        }
    }
}

impl Config {
    /// Load config from the repository root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| CourseError::ConfigParse {
            path,
            message: e.to_string(),
        })
    }

    /// Write the commented default config, with the upstream URL filled in
    /// when known. Used by `course init`; overwrites any existing file.
    pub fn write_default(root: &Path, upstream_url: Option<&str>) -> Result<()> {
        let upstream_line = match upstream_url {
            Some(url) => format!("url = {}", toml::Value::String(url.to_string())),
            None => "# url = \"https://example.org/course.git\"".to_string(),
        };
        let content = format!(
            r#"# course configuration file

[upstream]
# Fetch URL the shared course repository ('upstream' remote) must point to.
# Leave unset to skip URL verification during `course sync`.
{upstream_line}

[runner]
# Command that executes a chapter's tests.html in a headless browser and
# prints the score report as JSON on stdout.
command = "{DEFAULT_RUNNER_COMMAND}"
"#
        );
        fs::write(root.join(CONFIG_FILE), content)?;
        Ok(())
    }
}
