//! Implementation of the `lambgo init` command.
//!
//! Writes an annotated `.lambgo.yml` next to the nearest `go.mod`.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use lambgo_lib::init::init;

use crate::output::symbols;

pub fn cmd_init() -> Result<()> {
  let cwd = super::working_dir()?;
  let result = init(&cwd).context("Failed to initialize manifest")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Created example manifest!".green().bold()
  );
  println!();
  println!("  {} Project root: {}", symbols::INFO.cyan(), result.root_path.display());
  println!("  {} Manifest:     {}", symbols::INFO.cyan(), result.manifest.display());
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. List your Lambdas under buildPaths in {}",
    result.manifest.display().to_string().cyan()
  );
  println!("  2. Run: {}", "lambgo build".cyan());

  Ok(())
}
