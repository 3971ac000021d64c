use std::path::PathBuf;

use log::{debug, error};
use thiserror::Error;

use crate::command::{CommandError, CommandRunner};
use crate::change::{ChangeType, CodeChange};

#[derive(Error, Debug)]
pub enum GitError {
  #[error("Failed to get diff between branches")]
  DiffFailed {
    #[source]
    source: CommandError
  }
}

pub type Result<T, E = GitError> = std::result::Result<T, E>;

/// Source of the file-level changes between two branches.
pub trait GitService {
  /// Returns every file that differs between the merge base of `base_branch`
  /// and `compare_branch` and the tip of `compare_branch`, in listing order.
  fn diff_between_branches(&self, base_branch: &str, compare_branch: &str) -> Result<Vec<CodeChange>>;
}

/// [`GitService`] backed by the `git` executable.
///
/// Each changed file costs two or three `git` invocations: one status lookup
/// and one `git show` per side the file exists on.
#[derive(Debug, Clone)]
pub struct ProcessGitService {
  runner: CommandRunner
}

impl ProcessGitService {
  pub fn new() -> Self {
    Self::new_with_path(".")
  }

  pub fn new_with_path(path: impl Into<PathBuf>) -> Self {
    Self { runner: CommandRunner::new(path) }
  }

  fn collect_changes(&self, base_branch: &str, compare_branch: &str) -> Result<Vec<CodeChange>, CommandError> {
    let files = self.changed_files(base_branch, compare_branch)?;
    debug!("[diff] {} changed file(s) between {}...{}", files.len(), base_branch, compare_branch);

    let mut changes = Vec::with_capacity(files.len());
    for file in files {
      let change_type = self.change_type(base_branch, compare_branch, &file)?;
      debug!("[diff] {} {}", change_type.letter(), file);

      let old_content = match change_type {
        ChangeType::Added => String::new(),
        _ => self.file_content(base_branch, &file)?
      };
      let new_content = match change_type {
        ChangeType::Deleted => String::new(),
        _ => self.file_content(compare_branch, &file)?
      };

      changes.push(CodeChange::new(file, old_content, new_content, change_type));
    }

    Ok(changes)
  }

  /// Paths listed by `git diff --name-status <base>...<compare>`.
  pub fn changed_files(&self, base_branch: &str, compare_branch: &str) -> Result<Vec<String>, CommandError> {
    let range = range(base_branch, compare_branch);
    let args = ["diff", "--name-status", range.as_str()];
    let output = self.runner.run("git", &args)?;
    parse_name_status(&output).map_err(|line| CommandError::UnexpectedOutput {
      command: format!("git {}", args.join(" ")),
      line
    })
  }

  /// Classifies `file` by its own name-status line.
  pub fn change_type(&self, base_branch: &str, compare_branch: &str, file: &str) -> Result<ChangeType, CommandError> {
    let range = range(base_branch, compare_branch);
    let output = self.runner.run("git", &["diff", "--name-status", &range, "--", file])?;
    Ok(ChangeType::from_status(output.lines().next().unwrap_or_default()))
  }

  /// Content of `file` at `branch`, with every line terminated by `\n`.
  pub fn file_content(&self, branch: &str, file: &str) -> Result<String, CommandError> {
    let object = format!("{branch}:{file}");
    let output = self.runner.run("git", &["show", &object])?;
    Ok(normalize_lines(&output))
  }
}

impl Default for ProcessGitService {
  fn default() -> Self {
    Self::new()
  }
}

impl GitService for ProcessGitService {
  fn diff_between_branches(&self, base_branch: &str, compare_branch: &str) -> Result<Vec<CodeChange>> {
    self.collect_changes(base_branch, compare_branch).map_err(|source| {
      error!("[diff] {}...{} aborted: {}", base_branch, compare_branch, source);
      GitError::DiffFailed { source }
    })
  }
}

fn range(base_branch: &str, compare_branch: &str) -> String {
  format!("{base_branch}...{compare_branch}")
}

/// Drops the status code and its separator from each name-status line.
///
/// A non-blank line with nothing after the separator is returned as the error.
fn parse_name_status(output: &str) -> Result<Vec<String>, String> {
  output
    .lines()
    .filter(|line| !line.is_empty())
    .map(|line| match line.get(2..) {
      Some(path) if !path.is_empty() => Ok(path.to_string()),
      _ => Err(line.to_string())
    })
    .collect()
}

fn normalize_lines(output: &str) -> String {
  let mut content = String::with_capacity(output.len() + 1);
  for line in output.lines() {
    content.push_str(line);
    content.push('\n');
  }
  content
}
