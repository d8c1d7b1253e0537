//! Zip packaging of compiled units.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write archive {path}: {source}")]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("archive timestamp out of range")]
  Timestamp,

  /// The packaging task did not run to completion.
  #[error("packaging {path} was interrupted: {message}")]
  Interrupted { path: PathBuf, message: String },
}

/// Wraps a built artifact into an archive.
pub trait Packager {
  /// Archive `file` under `entry_name`, returning the archive path.
  fn archive(&self, file: &Path, entry_name: &str) -> Result<PathBuf, PackageError>;
}

/// Writes `<file>.zip` holding a single deflated entry.
///
/// The entry timestamp is pinned to 2009-11-10 00:00:00 and its unix mode is
/// taken from the source file, so the same input always produces the same
/// archive bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackager;

impl ZipPackager {
  fn options(file: &Path) -> Result<SimpleFileOptions, PackageError> {
    let modified = DateTime::from_date_and_time(2009, 11, 10, 0, 0, 0).map_err(|_| PackageError::Timestamp)?;
    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(modified);

    #[cfg(unix)]
    let options = {
      use std::os::unix::fs::PermissionsExt;

      let metadata = std::fs::metadata(file).map_err(|source| PackageError::Read {
        path: file.to_path_buf(),
        source,
      })?;
      options.unix_permissions(metadata.permissions().mode())
    };
    #[cfg(not(unix))]
    let _ = file;

    Ok(options)
  }
}

impl Packager for ZipPackager {
  fn archive(&self, file: &Path, entry_name: &str) -> Result<PathBuf, PackageError> {
    let mut archive_name = file.as_os_str().to_owned();
    archive_name.push(".zip");
    let archive_path = PathBuf::from(archive_name);

    let contents = std::fs::read(file).map_err(|source| PackageError::Read {
      path: file.to_path_buf(),
      source,
    })?;
    let options = Self::options(file)?;

    let zip_err = |source| PackageError::Zip {
      path: archive_path.clone(),
      source,
    };
    let write_err = |source| PackageError::Write {
      path: archive_path.clone(),
      source,
    };

    let output = File::create(&archive_path).map_err(write_err)?;
    let mut writer = ZipWriter::new(BufWriter::new(output));
    writer.start_file(entry_name, options).map_err(zip_err)?;
    writer.write_all(&contents).map_err(write_err)?;
    writer.finish().map_err(zip_err)?.flush().map_err(write_err)?;

    debug!(archive = %archive_path.display(), entry = entry_name, bytes = contents.len(), "wrote archive");
    Ok(archive_path)
  }
}
