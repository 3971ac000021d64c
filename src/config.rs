use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use config::{Config, FileFormat};
use anyhow::{Context, Result};

// Constants
const DEFAULT_BASE_BRANCH: &str = "master";
const DEFAULT_REPO: &str = ".";
const DEFAULT_FORMAT: &str = "text";
const ENV_PREFIX: &str = "PR_DIFF";

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  #[default]
  Text,
  Json
}

#[derive(Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct App {
  pub base_branch: String,
  pub repo:        PathBuf,
  pub format:      Format
}

#[derive(Debug)]
pub struct ConfigPaths {
  pub file: PathBuf
}

impl ConfigPaths {
  pub fn new() -> Option<Self> {
    let file = home::home_dir()?.join(".config/git-pr-diff/config.ini");
    Some(Self { file })
  }
}

impl App {
  /// Loads defaults, then `~/.config/git-pr-diff/config.ini` if present, then
  /// `PR_DIFF_*` environment variables.
  pub fn new() -> Result<Self> {
    dotenv::dotenv().ok();
    Self::load(ConfigPaths::new().map(|paths| paths.file))
  }

  pub fn load(file: Option<PathBuf>) -> Result<Self> {
    let mut builder = Config::builder()
      .set_default("base_branch", DEFAULT_BASE_BRANCH)?
      .set_default("repo", DEFAULT_REPO)?
      .set_default("format", DEFAULT_FORMAT)?;

    if let Some(file) = file {
      log::debug!("Reading config from {}", file.display());
      builder = builder.add_source(config::File::new(file.to_string_lossy().as_ref(), FileFormat::Ini).required(false));
    }

    builder
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()
      .context("Failed to build configuration")?
      .try_deserialize()
      .context("Failed to deserialize configuration")
  }
}
