//! Compiler process execution.
//!
//! The scheduler never spawns processes directly; it goes through a
//! [`CommandRunner`] so tests can substitute a recording fake.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecParams {
  /// Directory the command runs in.
  pub working_dir: PathBuf,
  pub command: String,
  pub args: Vec<String>,
  /// Variables layered on top of the inherited environment.
  pub env: BTreeMap<String, String>,
}

impl ExecParams {
  /// The command line as a single space-separated string, for messages.
  pub fn command_line(&self) -> String {
    std::iter::once(self.command.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to start `{command}`: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("`{command}` failed ({status}){}", format_output(.output))]
  Exit {
    command: String,
    status: String,
    /// Captured stdout followed by stderr.
    output: String,
  },
}

fn format_output(output: &str) -> String {
  let output = output.trim_end();
  if output.is_empty() {
    String::new()
  } else {
    format!("\n{output}")
  }
}

/// Runs external commands on behalf of the scheduler.
pub trait CommandRunner {
  /// Run a command to completion.
  ///
  /// Returns the captured stdout followed by stderr when the command exits
  /// successfully.
  fn exec(&self, params: ExecParams) -> impl Future<Output = Result<String, ProcessError>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl CommandRunner for TokioRunner {
  async fn exec(&self, params: ExecParams) -> Result<String, ProcessError> {
    let command_line = params.command_line();
    debug!(command = %command_line, working_dir = ?params.working_dir, "spawning process");

    let output = Command::new(&params.command)
      .args(&params.args)
      .current_dir(&params.working_dir)
      .envs(&params.env)
      .output()
      .await
      .map_err(|source| ProcessError::Spawn {
        command: command_line.clone(),
        source,
      })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
      debug!(command = %command_line, status = %output.status, "process failed");
      return Err(ProcessError::Exit {
        command: command_line,
        status: output.status.to_string(),
        output: combined,
      });
    }

    Ok(combined)
  }
}
