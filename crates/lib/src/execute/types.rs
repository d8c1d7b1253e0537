//! Error and outcome types for a build run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::package::PackageError;
use super::process::ProcessError;

/// Lifecycle of one [`BuildScheduler::run`](super::BuildScheduler::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
  WarmingDependencies,
  Dispatching,
  Draining,
  Done,
}

impl fmt::Display for SchedulerState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SchedulerState::WarmingDependencies => "warming-dependencies",
      SchedulerState::Dispatching => "dispatching",
      SchedulerState::Draining => "draining",
      SchedulerState::Done => "done",
    };
    f.write_str(name)
  }
}

/// The step of a unit build that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
  Compile,
  Package,
  /// The unit's build task stopped before it could report.
  Worker,
}

impl fmt::Display for BuildPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildPhase::Compile => f.write_str("compile"),
      BuildPhase::Package => f.write_str("package"),
      BuildPhase::Worker => f.write_str("worker"),
    }
  }
}

#[derive(Debug, Error)]
pub enum UnitError {
  #[error(transparent)]
  Compile(ProcessError),

  #[error(transparent)]
  Package(PackageError),

  #[error("build task aborted: {message}")]
  Aborted { message: String },
}

impl UnitError {
  pub fn phase(&self) -> BuildPhase {
    match self {
      UnitError::Compile(_) => BuildPhase::Compile,
      UnitError::Package(_) => BuildPhase::Package,
      UnitError::Aborted { .. } => BuildPhase::Worker,
    }
  }
}

/// A single unit that did not produce an archive.
#[derive(Debug, Error)]
#[error("{path}: {} failed: {source}", .source.phase())]
pub struct UnitFailure {
  pub path: String,
  #[source]
  pub source: UnitError,
}

impl UnitFailure {
  pub fn phase(&self) -> BuildPhase {
    self.source.phase()
  }
}

/// Every unit failure of one run, in the order the units finished.
#[derive(Debug, Default)]
pub struct AggregateError {
  pub failures: Vec<UnitFailure>,
}

impl AggregateError {
  pub fn is_empty(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn len(&self) -> usize {
    self.failures.len()
  }
}

impl fmt::Display for AggregateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let noun = if self.failures.len() == 1 { "unit" } else { "units" };
    write!(f, "{} {noun} failed to build", self.failures.len())?;
    for failure in &self.failures {
      write!(f, "\n  {failure}")?;
    }
    Ok(())
  }
}

impl std::error::Error for AggregateError {}

#[derive(Debug, Error)]
pub enum BuildError {
  /// The dependency warm-up failed, so no unit was built.
  #[error("failed to download dependencies: {0}")]
  Dependencies(#[source] ProcessError),

  #[error(transparent)]
  Units(#[from] AggregateError),
}

/// Archives produced by a successful run, sorted by unit path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  pub archives: Vec<(String, PathBuf)>,
}
