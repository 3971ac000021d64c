pub mod change;
pub mod command;
pub mod config;
pub mod git;
pub mod profiling;

// Re-exports
pub use change::{ChangeType, CodeChange};
pub use git::{GitError, GitService, ProcessGitService};
pub use command::{CommandError, CommandRunner};
pub use profiling::Profile;
