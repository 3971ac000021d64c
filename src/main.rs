use std::path::PathBuf;

use prdiff::config::{App, Format};
use prdiff::{ChangeType, CodeChange, GitService, ProcessGitService};
use anyhow::{Context, Result};
use log::{debug, LevelFilter};
use clap::Parser;
use colored::*;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Lists the files changed between two branches")]
struct Cli {
  /// `[BASE] COMPARE`; BASE falls back to the configured base branch
  #[clap(required = true, num_args = 1..=2, value_names = ["BASE", "COMPARE"])]
  branches: Vec<String>,

  #[clap(long, help = "Repository to diff (defaults to the current directory)")]
  repo: Option<PathBuf>,

  #[clap(long, help = "Print the changes as JSON", default_value = "false")]
  json: bool,

  #[clap(short, long, help = "Enables verbose logging", default_value = "false")]
  verbose: bool
}

impl Cli {
  fn branches<'a>(&'a self, app: &'a App) -> (&'a str, &'a str) {
    match self.branches.as_slice() {
      [base, compare] => (base.as_str(), compare.as_str()),
      [compare] => (app.base_branch.as_str(), compare.as_str()),
      _ => unreachable!("clap enforces one or two branches")
    }
  }
}

fn print_text(changes: &[CodeChange]) {
  if changes.is_empty() {
    println!("{}", "No changes".dimmed());
    return;
  }

  for change in changes {
    let letter = change.change_type.letter().to_string();
    let letter = match change.change_type {
      ChangeType::Added => letter.green(),
      ChangeType::Modified => letter.yellow(),
      ChangeType::Deleted => letter.red()
    };
    println!("{}  {}", letter.bold(), change.file_path.white());
  }

  let count = |kind: fn(&CodeChange) -> bool| changes.iter().filter(|c| kind(c)).count();
  println!(
    "\n{} file(s) changed: {} added, {} modified, {} deleted",
    changes.len(),
    count(CodeChange::is_added),
    count(CodeChange::is_modified),
    count(CodeChange::is_deleted)
  );
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.verbose {
    env_logger::builder()
      .filter_level(LevelFilter::Debug)
      .format_target(false)
      .format_timestamp(None)
      .init();
    debug!("Verbose logging enabled");
  } else {
    env_logger::init();
  }

  let app = App::new()?;
  let (base, compare) = cli.branches(&app);
  let repo = cli.repo.clone().unwrap_or_else(|| app.repo.clone());
  debug!("Diffing {}...{} in {}", base, compare, repo.display());

  let service = ProcessGitService::new_with_path(repo);
  let changes = service.diff_between_branches(base, compare)?;

  if cli.json || app.format == Format::Json {
    let json = serde_json::to_string_pretty(&changes).context("Failed to serialize changes")?;
    println!("{json}");
  } else {
    print_text(&changes);
  }

  Ok(())
}
