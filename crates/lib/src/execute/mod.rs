//! Parallel build execution.
//!
//! [`BuildScheduler::run`] warms the compiler's dependency cache once, then
//! feeds every unit through a fixed pool of workers. Each worker compiles a
//! unit and packages the result; failures are reported back to the scheduler
//! over a channel and never stop sibling units.

mod package;
mod process;
mod types;

pub use package::{PackageError, Packager, ZipPackager};
pub use process::{CommandRunner, ExecParams, ProcessError, TokioRunner};
pub use types::{AggregateError, BuildError, BuildPhase, BuildReport, SchedulerState, UnitError, UnitFailure};

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::consts::{COMPILER, TARGET_ARCH_ENV, TARGET_OS_ENV};
use crate::manifest::{Config, Unit};

/// Settings shared by every unit of one run.
struct RunContext {
  root_path: PathBuf,
  out_directory: PathBuf,
  zipped_file_name: Option<String>,
  env: BTreeMap<String, String>,
}

impl RunContext {
  fn new(config: &Config) -> Self {
    let env = BTreeMap::from([
      (TARGET_OS_ENV.to_string(), config.target_os.clone()),
      (TARGET_ARCH_ENV.to_string(), config.target_arch.clone()),
    ]);

    Self {
      root_path: config.root_path.clone(),
      out_directory: PathBuf::from(&config.out_directory),
      zipped_file_name: config.zipped_file_name.clone(),
      env,
    }
  }

  fn go_build(&self, args: Vec<String>) -> ExecParams {
    ExecParams {
      working_dir: self.root_path.clone(),
      command: COMPILER.to_string(),
      args,
      env: self.env.clone(),
    }
  }
}

type UnitOutcome = Result<(String, PathBuf), UnitFailure>;

/// Builds and packages every unit of a [`Config`].
pub struct BuildScheduler<R, P> {
  runner: Arc<R>,
  packager: Arc<P>,
}

impl<R, P> BuildScheduler<R, P>
where
  R: CommandRunner + Send + Sync + 'static,
  P: Packager + Send + Sync + 'static,
{
  pub fn new(runner: R, packager: P) -> Self {
    Self {
      runner: Arc::new(runner),
      packager: Arc::new(packager),
    }
  }

  /// Build every unit of `config` with at most `config.num_parallel` units in
  /// flight.
  ///
  /// # Errors
  ///
  /// - [`BuildError::Dependencies`] if the warm-up build fails; no unit runs
  /// - [`BuildError::Units`] with every unit failure once all units finished
  pub async fn run(&self, config: &Config) -> Result<BuildReport, BuildError> {
    let context = Arc::new(RunContext::new(config));
    // never more workers than units
    let workers = config.num_parallel.clamp(1, config.units.len().max(1));
    info!(
      unit_count = config.units.len(),
      workers,
      target_os = %config.target_os,
      target_arch = %config.target_arch,
      "starting build"
    );

    if config.units.len() > 1 {
      info!(state = %SchedulerState::WarmingDependencies, "warming dependency cache");
      self.warm_dependencies(&context, &config.units).await?;
    }

    info!(state = %SchedulerState::Dispatching, workers, "dispatching units");
    let (queue_tx, queue_rx) = mpsc::channel::<Unit>(workers);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<UnitOutcome>();
    let queue_rx = Arc::new(Mutex::new(queue_rx));

    let mut join_set = JoinSet::new();
    for worker_id in 0..workers {
      join_set.spawn(worker(
        worker_id,
        Arc::clone(&context),
        Arc::clone(&self.runner),
        Arc::clone(&self.packager),
        Arc::clone(&queue_rx),
        outcome_tx.clone(),
      ));
    }
    drop(outcome_tx);

    for unit in &config.units {
      if queue_tx.send(unit.clone()).await.is_err() {
        // every worker is gone; whatever was not queued cannot run
        error!(unit = %unit.path, "no worker left to accept unit");
        break;
      }
    }
    drop(queue_tx);

    info!(state = %SchedulerState::Draining, "waiting for workers");
    while let Some(joined) = join_set.join_next().await {
      if let Err(e) = joined {
        error!(error = %e, "build worker panicked");
      }
    }

    let mut archives = Vec::with_capacity(config.units.len());
    let mut failed = AggregateError::default();
    let mut reported = HashSet::with_capacity(config.units.len());
    while let Some(outcome) = outcome_rx.recv().await {
      match outcome {
        Ok(archive) => {
          reported.insert(archive.0.clone());
          archives.push(archive);
        }
        Err(failure) => {
          reported.insert(failure.path.clone());
          failed.failures.push(failure);
        }
      }
    }

    for unit in config.units.iter().filter(|unit| !reported.contains(&unit.path)) {
      error!(unit = %unit.path, "unit finished without a result");
      failed.failures.push(UnitFailure {
        path: unit.path.clone(),
        source: UnitError::Aborted {
          message: "no result was reported".to_string(),
        },
      });
    }

    info!(
      state = %SchedulerState::Done,
      succeeded = archives.len(),
      failed = failed.len(),
      "build finished"
    );

    if !failed.is_empty() {
      return Err(BuildError::Units(failed));
    }

    archives.sort();
    Ok(BuildReport { archives })
  }

  async fn warm_dependencies(&self, context: &RunContext, units: &[Unit]) -> Result<(), BuildError> {
    let mut args = vec!["build".to_string(), "-trimpath".to_string()];
    args.extend(units.iter().map(|unit| package_arg(&unit.path)));

    self
      .runner
      .exec(context.go_build(args))
      .await
      .map_err(|e| {
        error!(error = %e, "dependency warm-up failed");
        BuildError::Dependencies(e)
      })?;
    Ok(())
  }
}

async fn worker<R, P>(
  worker_id: usize,
  context: Arc<RunContext>,
  runner: Arc<R>,
  packager: Arc<P>,
  queue: Arc<Mutex<mpsc::Receiver<Unit>>>,
  outcomes: mpsc::UnboundedSender<UnitOutcome>,
) where
  R: CommandRunner + Send + Sync + 'static,
  P: Packager + Send + Sync + 'static,
{
  loop {
    let next = queue.lock().await.recv().await;
    let Some(unit) = next else {
      break;
    };

    debug!(worker = worker_id, unit = %unit.path, "unit picked up");
    // panics stay confined to the unit that raised them
    let task = tokio::spawn(build_unit(
      Arc::clone(&context),
      Arc::clone(&runner),
      Arc::clone(&packager),
      unit.clone(),
    ));
    let result = match task.await {
      Ok(result) => result,
      Err(e) => Err(UnitError::Aborted { message: e.to_string() }),
    };

    let outcome = result
      .map(|archive| (unit.path.clone(), archive))
      .map_err(|source| UnitFailure {
        path: unit.path.clone(),
        source,
      });

    match &outcome {
      Ok((path, archive)) => info!(unit = %path, archive = %archive.display(), "unit built"),
      Err(failure) => error!(unit = %failure.path, phase = %failure.phase(), error = %failure.source, "unit failed"),
    }

    // the receiver outlives every worker
    let _ = outcomes.send(outcome);
  }
  debug!(worker = worker_id, "worker finished");
}

/// Compile one unit and package the binary.
async fn build_unit<R, P>(
  context: Arc<RunContext>,
  runner: Arc<R>,
  packager: Arc<P>,
  unit: Unit,
) -> Result<PathBuf, UnitError>
where
  R: CommandRunner + Send + Sync + 'static,
  P: Packager + Send + Sync + 'static,
{
  let output = context.out_directory.join(&unit.path);

  let mut args = vec![
    "build".to_string(),
    "-trimpath".to_string(),
    "-o".to_string(),
    output.to_string_lossy().into_owned(),
  ];
  args.extend(unit.build_flags.iter().cloned());
  args.push(package_arg(&unit.path));

  runner
    .exec(context.go_build(args))
    .await
    .map_err(UnitError::Compile)?;

  let entry_name = entry_name(&unit, context.zipped_file_name.as_deref(), &output);
  let binary = context.root_path.join(&output);

  tokio::task::spawn_blocking(move || packager.archive(&binary, &entry_name))
    .await
    .map_err(|e| {
      UnitError::Package(PackageError::Interrupted {
        path: context.root_path.join(&output),
        message: e.to_string(),
      })
    })?
    .map_err(UnitError::Package)
}

/// Archive entry name: unit override, then manifest default, then the binary's file name.
fn entry_name(unit: &Unit, manifest_default: Option<&str>, output: &Path) -> String {
  unit
    .zipped_file_name
    .as_deref()
    .or(manifest_default)
    .map(str::to_string)
    .or_else(|| output.file_name().map(|name| name.to_string_lossy().into_owned()))
    .unwrap_or_else(|| unit.path.clone())
}

/// Package argument for the compiler, always relative to the root.
fn package_arg(path: &str) -> String {
  if path == "." || path.starts_with("./") || path.starts_with("../") || path.starts_with('/') {
    path.to_string()
  } else {
    format!("./{path}")
  }
}
