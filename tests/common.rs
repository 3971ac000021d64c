#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use prdiff::ProcessGitService;
use tempfile::TempDir;

pub fn setup() {
  _ = env_logger::builder().is_test(true).try_init();
}

/// Throwaway repository driven through the `git` executable.
pub struct TestRepo {
  dir: TempDir
}

impl TestRepo {
  /// Creates a repository whose first commit sits on `master`.
  pub fn new() -> (Self, ProcessGitService) {
    let repo = TestRepo { dir: TempDir::new().expect("Could not create temp dir") };

    repo.git(&["init", "--quiet"]).expect("git init failed");
    repo.git(&["symbolic-ref", "HEAD", "refs/heads/master"]).unwrap();
    repo.git(&["config", "user.name", "Your Name"]).unwrap();
    repo.git(&["config", "user.email", "email@example.com"]).unwrap();
    repo.git(&["config", "commit.gpgsign", "false"]).unwrap();
    repo.git(&["config", "core.autocrlf", "false"]).unwrap();
    repo.git(&["config", "diff.renames", "true"]).unwrap();

    let service = ProcessGitService::new_with_path(repo.path());
    (repo, service)
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn write_file(&self, name: &str, content: &str) {
    let file_path = self.path().join(name);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent).expect("Could not create directories");
    }
    std::fs::write(&file_path, content).expect("Could not write file");
  }

  pub fn delete_file(&self, name: &str) {
    std::fs::remove_file(self.path().join(name)).expect("Could not delete file");
  }

  /// Stages everything and commits, even when nothing changed.
  pub fn commit(&self, message: &str) {
    self.git(&["add", "--all"]).expect("git add failed");
    self.git(&["commit", "--quiet", "--allow-empty", "-m", message]).expect("git commit failed");
  }

  pub fn branch(&self, name: &str) {
    self.git(&["checkout", "--quiet", "-b", name]).expect("git checkout -b failed");
  }

  pub fn checkout(&self, name: &str) {
    self.git(&["checkout", "--quiet", name]).expect("git checkout failed");
  }

  pub fn git(&self, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
      .args(args)
      .env("OVERCOMMIT_DISABLE", "1")
      .current_dir(self.path())
      .output()
      .context("Could not run git command")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      bail!("Git command failed: {}", stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }
}
