mod build;
mod init;
mod list;

pub use build::cmd_build;
pub use init::cmd_init;
pub use list::cmd_list;

use std::path::PathBuf;

use anyhow::{Context, Result};

use lambgo_lib::manifest::{Config, FsReader, ManifestResolver};

/// The canonical working directory every command starts from.
fn working_dir() -> Result<PathBuf> {
  let cwd = std::env::current_dir().context("Failed to read the current directory")?;
  dunce::canonicalize(&cwd).with_context(|| format!("Failed to canonicalize {}", cwd.display()))
}

/// Resolve the manifest for the working directory.
fn resolve_config() -> Result<Config> {
  let cwd = working_dir()?;
  ManifestResolver::new(FsReader)
    .resolve(&cwd)
    .context("Failed to load manifest")
}
