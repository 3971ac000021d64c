//! Domain types describing what changed between two branches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a file differs between the base and the compare branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
  Added,
  Modified,
  Deleted
}

impl ChangeType {
  /// Maps a `git diff --name-status` line onto a change type.
  ///
  /// Only the first character is inspected. `A` and `D` are additions and
  /// deletions; everything else, including an empty line, is a modification.
  /// Renames, copies and type changes therefore collapse into `Modified`.
  pub fn from_status(line: &str) -> Self {
    match line.chars().next() {
      Some('A') => ChangeType::Added,
      Some('D') => ChangeType::Deleted,
      _ => ChangeType::Modified
    }
  }

  /// Single-letter status as printed by `git diff --name-status`.
  pub fn letter(&self) -> char {
    match self {
      ChangeType::Added => 'A',
      ChangeType::Modified => 'M',
      ChangeType::Deleted => 'D'
    }
  }
}

impl fmt::Display for ChangeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ChangeType::Added => "added",
      ChangeType::Modified => "modified",
      ChangeType::Deleted => "deleted"
    };
    write!(f, "{name}")
  }
}

/// A single changed file with its content on both sides.
///
/// `old_content` is empty for added files and `new_content` is empty for
/// deleted files. Modified files carry both, which may be identical when only
/// the mode changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
  pub file_path:   String,
  pub old_content: String,
  pub new_content: String,
  pub change_type: ChangeType
}

impl CodeChange {
  pub fn new(file_path: impl Into<String>, old_content: impl Into<String>, new_content: impl Into<String>, change_type: ChangeType) -> Self {
    Self {
      file_path: file_path.into(),
      old_content: old_content.into(),
      new_content: new_content.into(),
      change_type
    }
  }

  pub fn is_added(&self) -> bool {
    self.change_type == ChangeType::Added
  }

  pub fn is_deleted(&self) -> bool {
    self.change_type == ChangeType::Deleted
  }

  pub fn is_modified(&self) -> bool {
    self.change_type == ChangeType::Modified
  }
}
