use std::time::{Duration, Instant};

use colored::Colorize;

/// Drop guard that reports how long a named step took.
///
/// Nothing is printed unless debug logging is enabled.
pub struct Profile {
  start: Instant,
  name:  String
}

impl Profile {
  pub fn new(name: impl Into<String>) -> Self {
    Self { start: Instant::now(), name: name.into() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn elapsed(&self) -> Duration {
    self.start.elapsed()
  }
}

impl Drop for Profile {
  fn drop(&mut self) {
    if log::log_enabled!(log::Level::Debug) {
      log::debug!("{}: {:.2?}", self.name.blue(), self.elapsed());
    }
  }
}
