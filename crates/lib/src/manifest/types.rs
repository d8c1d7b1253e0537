//! Manifest types.
//!
//! [`RawManifest`] mirrors the YAML file exactly, including the two ways of
//! declaring units:
//!
//! ```yaml
//! buildPaths:
//!   - lambdas/hello_world
//! lambdas:
//!   - path: lambdas/with_flags
//!     buildFlags: -tags extra
//! ```
//!
//! [`Config`] is the resolved form consumed by the build scheduler.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The `.lambgo.yml` file as written on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawManifest {
  /// Base directory for build artifacts.
  pub out_directory: Option<String>,
  /// Entry name used inside every archive, unless a unit overrides it.
  pub zipped_file_name: Option<String>,
  /// Default build flags in shell syntax.
  pub build_flags: Option<String>,
  #[serde(rename = "targetOS", alias = "goos")]
  pub target_os: Option<String>,
  #[serde(rename = "targetArch", alias = "goarch")]
  pub target_arch: Option<String>,
  /// Units declared by path only.
  #[serde(default)]
  pub build_paths: Vec<String>,
  /// Units declared with per-unit settings.
  #[serde(default, alias = "lambdas")]
  pub units: Vec<RawUnit>,
}

impl RawManifest {
  /// Parse manifest YAML. An empty document is an empty manifest.
  pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(content)
  }
}

/// A unit entry in the `lambdas`/`units` list.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawUnit {
  pub path: String,
  /// `None` inherits the manifest default; `Some("")` means no flags.
  pub build_flags: Option<String>,
  pub zipped_file_name: Option<String>,
}

/// One buildable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
  /// Normalized path relative to the project root.
  pub path: String,
  /// Effective compiler flags.
  pub build_flags: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub zipped_file_name: Option<String>,
}

impl Unit {
  /// A unit with no flags and no archive name override.
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      build_flags: Vec::new(),
      zipped_file_name: None,
    }
  }
}

/// The fully resolved manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
  /// Directory containing `go.mod` and `.lambgo.yml`.
  pub root_path: PathBuf,
  /// Module path declared in `go.mod`.
  pub module_path: String,
  /// Artifact directory, relative to `root_path` unless absolute.
  pub out_directory: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub zipped_file_name: Option<String>,
  pub target_os: String,
  pub target_arch: String,
  pub units: Vec<Unit>,
  /// Worker pool width. Set by the caller after resolution.
  #[serde(skip)]
  pub num_parallel: usize,
}

impl Config {
  /// Paths of all units, in manifest order.
  pub fn unit_paths(&self) -> Vec<&str> {
    self.units.iter().map(|unit| unit.path.as_str()).collect()
  }
}
