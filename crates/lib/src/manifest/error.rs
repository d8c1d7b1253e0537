use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::flags::FlagError;

/// Where a unit was declared in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOrigin {
  /// Entry `index` of `buildPaths`.
  BuildPaths(usize),
  /// Entry `index` of `lambdas`/`units`.
  Units(usize),
}

impl fmt::Display for UnitOrigin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UnitOrigin::BuildPaths(index) => write!(f, "buildPaths[{index}]"),
      UnitOrigin::Units(index) => write!(f, "lambdas[{index}]"),
    }
  }
}

/// Errors raised while locating, reading, or normalizing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("cannot find root go.mod file by searching {} and its parent directories", start.display())]
  ProjectRootNotFound { start: PathBuf },

  #[error("cannot open the file '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot parse the file '{}': {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("empty path declared at {origin}")]
  EmptyPath { origin: UnitOrigin },

  #[error("duplicate build paths after normalization: {}", paths.join(", "))]
  DuplicatePaths { paths: Vec<String> },

  /// `unit` is the unit path, or `default` for the manifest-level flags.
  #[error("cannot parse build flags for {unit}: {source}")]
  FlagSyntax {
    unit: String,
    #[source]
    source: FlagError,
  },
}
