//! Locating and loading the manifest.
//!
//! The project root is the nearest directory, starting from the working
//! directory and walking up, that contains `go.mod`. The manifest is read from
//! that same directory.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::ManifestError;
use super::normalize::normalize_units;
use super::types::{Config, RawManifest};
use crate::consts::{DEFAULT_OUT_DIRECTORY, DEFAULT_TARGET_ARCH, DEFAULT_TARGET_OS, MANIFEST_FILE, ROOT_MARKER_FILE};

/// Source of file contents for the resolver.
pub trait FileReader {
  /// Read a whole file. A missing file must yield [`io::ErrorKind::NotFound`].
  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads from the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl FileReader for FsReader {
  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path)
  }
}

/// Values used when the manifest leaves a setting out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
  pub out_directory: String,
  pub target_os: String,
  pub target_arch: String,
}

impl Default for Defaults {
  fn default() -> Self {
    Self {
      out_directory: DEFAULT_OUT_DIRECTORY.to_string(),
      target_os: DEFAULT_TARGET_OS.to_string(),
      target_arch: DEFAULT_TARGET_ARCH.to_string(),
    }
  }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Produces a [`Config`] from the manifest nearest to a starting directory.
pub struct ManifestResolver<R> {
  reader: R,
  defaults: Defaults,
  lookup: Lookup,
}

impl<R: FileReader> ManifestResolver<R> {
  /// A resolver with the built-in defaults that expands flags from the process environment.
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      defaults: Defaults::default(),
      lookup: Box::new(|name: &str| std::env::var(name).ok()),
    }
  }

  pub fn with_defaults(mut self, defaults: Defaults) -> Self {
    self.defaults = defaults;
    self
  }

  /// Replace the variable lookup used when expanding build flags.
  pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
    self.lookup = Box::new(lookup);
    self
  }

  /// Locate, parse, and normalize the manifest for `start`.
  ///
  /// `start` should be absolute; the returned `root_path` is `start` or one of
  /// its ancestors. `num_parallel` is left at 1 for the caller to set.
  pub fn resolve(&self, start: &Path) -> Result<Config, ManifestError> {
    let (root_path, marker) = self.find_root(start)?;

    let marker_path = root_path.join(ROOT_MARKER_FILE);
    let module_path = parse_module_path(&String::from_utf8_lossy(&marker)).ok_or_else(|| ManifestError::Parse {
      path: marker_path,
      message: "missing module directive".to_string(),
    })?;

    let manifest_path = root_path.join(MANIFEST_FILE);
    let content = self
      .reader
      .read_file(&manifest_path)
      .map_err(|source| ManifestError::Io {
        path: manifest_path.clone(),
        source,
      })?;

    let raw = RawManifest::parse(&String::from_utf8_lossy(&content)).map_err(|e| ManifestError::Parse {
      path: manifest_path.clone(),
      message: e.to_string(),
    })?;

    let units = normalize_units(&raw.build_paths, &raw.units, raw.build_flags.as_deref(), |name| {
      (self.lookup)(name)
    })?;

    info!(
      root = %root_path.display(),
      module = %module_path,
      unit_count = units.len(),
      "resolved manifest"
    );

    Ok(Config {
      root_path,
      module_path,
      out_directory: or_default(raw.out_directory, &self.defaults.out_directory),
      zipped_file_name: raw.zipped_file_name.filter(|name| !name.trim().is_empty()),
      target_os: or_default(raw.target_os, &self.defaults.target_os),
      target_arch: or_default(raw.target_arch, &self.defaults.target_arch),
      units,
      num_parallel: 1,
    })
  }

  /// The nearest directory at or above `start` holding the root marker.
  pub fn project_root(&self, start: &Path) -> Result<PathBuf, ManifestError> {
    self.find_root(start).map(|(root, _)| root)
  }

  /// Walk up from `start` until a directory containing the root marker is found.
  fn find_root(&self, start: &Path) -> Result<(PathBuf, Vec<u8>), ManifestError> {
    let mut dir = start.to_path_buf();

    loop {
      let marker = dir.join(ROOT_MARKER_FILE);
      match self.reader.read_file(&marker) {
        Ok(content) => return Ok((dir, content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
          debug!(dir = %dir.display(), "no root marker found, checking parent");
          let parent = dir.parent().filter(|p| *p != dir.as_path()).map(Path::to_path_buf);
          match parent {
            Some(parent) => dir = parent,
            None => {
              return Err(ManifestError::ProjectRootNotFound {
                start: start.to_path_buf(),
              });
            }
          }
        }
        Err(source) => return Err(ManifestError::Io { path: marker, source }),
      }
    }
  }
}

/// Extract the module path from the `module` directive of a `go.mod` file.
fn parse_module_path(content: &str) -> Option<String> {
  content.lines().find_map(|line| {
    let line = line.split("//").next().unwrap_or_default().trim();
    let rest = line.strip_prefix("module")?;
    if !rest.starts_with(char::is_whitespace) {
      return None;
    }
    let path = rest.trim().trim_matches(|c: char| c == '"' || c == '`');
    (!path.is_empty()).then(|| path.to_string())
  })
}

fn or_default(value: Option<String>, fallback: &str) -> String {
  value
    .filter(|v| !v.trim().is_empty())
    .unwrap_or_else(|| fallback.to_string())
}
