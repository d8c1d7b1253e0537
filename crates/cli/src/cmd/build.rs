//! Implementation of the `lambgo build` command.

use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tracing::info;

use lambgo_lib::execute::{BuildScheduler, TokioRunner, ZipPackager};
use lambgo_lib::select::{Parallelism, filter_units};

use crate::output::{format_duration, print_info, print_success, symbols};

/// Width requested on the command line. `--disable-parallel` wins without
/// looking at `--num-parallel`.
fn requested_parallelism(num_parallel: &str, disable_parallel: bool) -> Result<Parallelism> {
  if disable_parallel {
    return Ok(Parallelism::Fixed(1));
  }
  Ok(num_parallel.parse()?)
}

/// Execute the build command.
///
/// Resolves the manifest, narrows it to the `--only` selection, then builds
/// and zips every remaining unit. A successful build is silent unless
/// `verbose` is set, in which case one line per archive is printed.
pub fn cmd_build(only: &[String], num_parallel: &str, disable_parallel: bool, verbose: bool) -> Result<()> {
  let parallelism = requested_parallelism(num_parallel, disable_parallel)?;

  let mut config = super::resolve_config()?;
  config.units = filter_units(&config.units, only)?;

  let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
  config.num_parallel = parallelism.resolve(config.units.len(), cpus)?;
  info!(cpus, num_parallel = config.num_parallel, "sized worker pool");

  if config.units.is_empty() {
    if verbose {
      print_info("No Lambdas declared, nothing to build");
    }
    return Ok(());
  }

  if verbose {
    print_info(&format!(
      "Building {} Lambda(s) for {}/{} with {} worker(s)",
      config.units.len(),
      config.target_os,
      config.target_arch,
      config.num_parallel
    ));
  }

  let started = Instant::now();
  let scheduler = BuildScheduler::new(TokioRunner, ZipPackager);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(scheduler.run(&config)).context("Build failed")?;

  if !verbose {
    return Ok(());
  }

  for (path, archive) in &report.archives {
    let shown = archive.strip_prefix(&config.root_path).unwrap_or(archive);
    println!(
      "  {} {} {}",
      path,
      symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      shown.display()
    );
  }
  print_success(&format!(
    "Built {} Lambda(s) in {}",
    report.archives.len(),
    format_duration(started.elapsed())
  ));

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disable_parallel_ignores_num_parallel() {
    assert_eq!(requested_parallelism("lots", true).unwrap(), Parallelism::Fixed(1));
    assert_eq!(requested_parallelism("8", true).unwrap(), Parallelism::Fixed(1));
  }

  #[test]
  fn num_parallel_is_parsed_when_enabled() {
    assert_eq!(requested_parallelism("all", false).unwrap(), Parallelism::All);
    assert_eq!(requested_parallelism("2x", false).unwrap(), Parallelism::PerCpu(2.0));
    let err = requested_parallelism("lots", false).unwrap_err();
    assert!(err.to_string().contains("invalid parallelism 'lots'"));
  }
}
