//! Runs external commands with a hard timeout.
//!
//! Both output pipes are drained on their own threads while the caller polls
//! the child, so a command that writes more than a pipe buffer can hold never
//! stalls. The timeout covers the whole command: the child must exit and both
//! pipes must close before the deadline. A descendant that keeps a pipe open
//! past it counts as a timeout; its reader thread is left behind and never
//! joined.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use std::path::PathBuf;
use std::io::{self, Read};
use std::thread;

use thiserror::Error;
use log::{debug, warn};

use crate::profiling::Profile;

/// Wall-clock limit for a single command.
pub const TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum CommandError {
  #[error("Failed to start command: {command}")]
  Spawn {
    command: String,
    #[source]
    source:  io::Error
  },

  #[error("IO error: {0}")]
  Io(#[from] io::Error),

  #[error("Command timed out after {timeout:?}: {command}")]
  Timeout { command: String, timeout: Duration },

  #[error("Command failed ({status}): {command}\nError: {stderr}")]
  Failed {
    command: String,
    status:  ExitStatus,
    stderr:  String
  },

  #[error("Unexpected output from {command}: {line:?}")]
  UnexpectedOutput { command: String, line: String }
}

/// Extension trait for converting captured output to UTF-8 strings
pub trait Utf8String {
  fn to_utf8(&self) -> String;
}

impl Utf8String for [u8] {
  fn to_utf8(&self) -> String {
    match std::str::from_utf8(self) {
      Ok(s) => s.to_string(),
      Err(_) => String::from_utf8_lossy(self).into_owned()
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
  Stdout,
  Stderr
}

type Chunk = (Stream, io::Result<Vec<u8>>);

/// Kills and reaps the child on every exit path.
struct ChildGuard(Child);

impl Drop for ChildGuard {
  fn drop(&mut self) {
    if let Ok(None) = self.0.try_wait() {
      let _ = self.0.kill();
    }
    let _ = self.0.wait();
  }
}

/// Runs commands inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
  dir:     PathBuf,
  timeout: Duration
}

impl CommandRunner {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self::with_timeout(dir, TIMEOUT)
  }

  pub(crate) fn with_timeout(dir: impl Into<PathBuf>, timeout: Duration) -> Self {
    Self { dir: dir.into(), timeout }
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  /// Runs `program` with `args` and returns its standard output.
  ///
  /// Fails with [`CommandError::Timeout`] when the command exceeds the
  /// runner's timeout and with [`CommandError::Failed`] on a non-zero exit,
  /// carrying whatever the command wrote to stderr.
  pub fn run(&self, program: &str, args: &[&str]) -> Result<String, CommandError> {
    let command = command_line(program, args);
    let _profile = Profile::new(command.clone());
    debug!("[run] {}", command);

    let deadline = Instant::now() + self.timeout;
    let child = Command::new(program)
      .args(args)
      .current_dir(&self.dir)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;
    let mut child = ChildGuard(child);

    let (tx, rx) = mpsc::channel();
    drain(child.0.stdout.take(), Stream::Stdout, tx.clone());
    drain(child.0.stderr.take(), Stream::Stderr, tx);

    let Some(status) = wait(&mut child.0, deadline)? else {
      warn!("[run] Killing {} after {:?}", command, self.timeout);
      drop(child);
      return Err(CommandError::Timeout { command, timeout: self.timeout });
    };

    let Some((stdout, stderr)) = collect(&rx, deadline)? else {
      warn!("[run] {} exited but its output was still open after {:?}", command, self.timeout);
      return Err(CommandError::Timeout { command, timeout: self.timeout });
    };

    if !status.success() {
      return Err(CommandError::Failed {
        command,
        status,
        stderr: stderr.to_utf8().trim_end().to_string()
      });
    }

    Ok(stdout.to_utf8())
  }
}

/// Polls the child until it exits or the deadline passes; `None` means timed out.
fn wait(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
  loop {
    if let Some(status) = child.try_wait()? {
      return Ok(Some(status));
    }
    if Instant::now() >= deadline {
      return Ok(None);
    }
    thread::sleep(POLL_INTERVAL);
  }
}

/// Waits for both pipes to close; `None` means the deadline passed first.
fn collect(rx: &Receiver<Chunk>, deadline: Instant) -> io::Result<Option<(Vec<u8>, Vec<u8>)>> {
  let mut stdout = None;
  let mut stderr = None;

  while stdout.is_none() || stderr.is_none() {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(remaining) {
      Ok((Stream::Stdout, out)) => stdout = Some(out?),
      Ok((Stream::Stderr, out)) => stderr = Some(out?),
      Err(RecvTimeoutError::Timeout) => return Ok(None),
      Err(RecvTimeoutError::Disconnected) => return Err(io::Error::other("output reader thread exited early"))
    }
  }

  Ok(stdout.zip(stderr))
}

fn command_line(program: &str, args: &[&str]) -> String {
  std::iter::once(program)
    .chain(args.iter().copied())
    .collect::<Vec<_>>()
    .join(" ")
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>, stream: Stream, tx: Sender<Chunk>) {
  thread::spawn(move || {
    let mut buf = Vec::new();
    let result = match pipe {
      Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
      None => Ok(buf)
    };
    // The receiver is gone once the command has timed out
    let _ = tx.send((stream, result));
  });
}
