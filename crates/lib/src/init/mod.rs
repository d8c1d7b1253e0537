//! Scaffold a manifest for an existing Go module.
//!
//! `lambgo init` locates the project root the same way a build does and
//! writes the annotated example manifest next to `go.mod`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::MANIFEST_FILE;
use crate::manifest::{EXAMPLE_MANIFEST, FsReader, ManifestError, ManifestResolver};

#[derive(Debug, Error)]
pub enum InitError {
  #[error(transparent)]
  Root(#[from] ManifestError),

  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  /// Directory containing `go.mod`.
  pub root_path: PathBuf,
  /// Path to the created manifest.
  pub manifest: PathBuf,
}

/// Write the example manifest into the project root above `start`.
///
/// # Errors
///
/// Returns an error if:
/// - no `go.mod` exists at or above `start`
/// - the manifest already exists
/// - writing the file fails
pub fn init(start: &Path) -> Result<InitResult, InitError> {
  let root_path = ManifestResolver::new(FsReader).project_root(start)?;
  let manifest = root_path.join(MANIFEST_FILE);

  // create_new so a manifest appearing after the root lookup is never clobbered
  let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&manifest) {
    Ok(file) => file,
    Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
      return Err(InitError::PathExists { path: manifest });
    }
    Err(source) => return Err(InitError::WriteFile { path: manifest, source }),
  };

  file
    .write_all(EXAMPLE_MANIFEST.as_bytes())
    .map_err(|source| InitError::WriteFile {
      path: manifest.clone(),
      source,
    })?;

  info!(manifest = %manifest.display(), "wrote example manifest");
  Ok(InitResult { root_path, manifest })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::RawManifest;
  use tempfile::TempDir;

  fn go_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
    temp_dir
  }

  #[test]
  fn writes_manifest_at_root() {
    let project = go_project();

    let result = init(project.path()).unwrap();
    assert_eq!(result.root_path, project.path());
    assert_eq!(result.manifest, project.path().join(".lambgo.yml"));
    assert_eq!(fs::read_to_string(&result.manifest).unwrap(), EXAMPLE_MANIFEST);
  }

  #[test]
  fn walks_up_from_subdirectory() {
    let project = go_project();
    let nested = project.path().join("lambdas/hello_world");
    fs::create_dir_all(&nested).unwrap();

    let result = init(&nested).unwrap();
    assert_eq!(result.root_path, project.path());
    assert!(project.path().join(".lambgo.yml").exists());
    assert!(!nested.join(".lambgo.yml").exists());
  }

  #[test]
  fn refuses_to_overwrite() {
    let project = go_project();
    let existing = project.path().join(".lambgo.yml");
    fs::write(&existing, "buildPaths: [mine]\n").unwrap();

    let err = init(project.path()).unwrap_err();
    assert!(matches!(err, InitError::PathExists { ref path } if path == &existing));
    assert_eq!(fs::read_to_string(&existing).unwrap(), "buildPaths: [mine]\n");
  }

  #[test]
  fn fails_outside_a_module() {
    let temp_dir = TempDir::new().unwrap();
    let err = init(temp_dir.path()).unwrap_err();
    assert!(matches!(err, InitError::Root(ManifestError::ProjectRootNotFound { .. })));
  }

  #[test]
  fn example_manifest_parses() {
    let raw = RawManifest::parse(EXAMPLE_MANIFEST).unwrap();
    assert_eq!(raw.out_directory.as_deref(), Some("tmp"));
    assert_eq!(raw.build_paths, vec!["lambdas/hello_world"]);
    assert!(raw.units.is_empty());
  }
}
