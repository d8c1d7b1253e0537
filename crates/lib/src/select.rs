//! Unit selection and worker-pool sizing for a build invocation.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::manifest::Unit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
  #[error("no unit matches '{filter}' (known units: {})", known_paths.join(", "))]
  UnmatchedFilter { filter: String, known_paths: Vec<String> },

  #[error("invalid parallelism '{value}': expected 'all', a positive integer, or a CPU multiple like '1.5x'")]
  InvalidNumParallel { value: String },
}

/// Keep the units matched by any of `filters`.
///
/// A filter matches a unit whose path equals it. A filter ending in `/`
/// also matches every unit below that directory. The result is deduplicated
/// and sorted by path. No filters selects every unit, unchanged.
///
/// # Errors
///
/// Returns [`SelectError::UnmatchedFilter`] for the first filter that matches
/// nothing.
pub fn filter_units(units: &[Unit], filters: &[String]) -> Result<Vec<Unit>, SelectError> {
  if filters.is_empty() {
    return Ok(units.to_vec());
  }

  let mut selected: BTreeMap<&str, &Unit> = BTreeMap::new();
  for filter in filters {
    let before = selected.len();
    let mut matched = false;

    for unit in units.iter().filter(|unit| matches_filter(&unit.path, filter)) {
      matched = true;
      selected.insert(unit.path.as_str(), unit);
    }

    if !matched {
      return Err(SelectError::UnmatchedFilter {
        filter: filter.clone(),
        known_paths: units.iter().map(|unit| unit.path.clone()).collect(),
      });
    }
    debug!(filter = %filter, added = selected.len() - before, "applied unit filter");
  }

  Ok(selected.into_values().cloned().collect())
}

fn matches_filter(path: &str, filter: &str) -> bool {
  path == filter || (filter.ends_with('/') && path.starts_with(filter))
}

/// Requested worker-pool width.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Parallelism {
  /// One worker per selected unit.
  #[default]
  All,
  Fixed(usize),
  /// A multiple of the available CPUs.
  PerCpu(f64),
}

impl Parallelism {
  /// Concrete worker count for `unit_count` selected units on `cpus` CPUs.
  ///
  /// # Errors
  ///
  /// Returns [`SelectError::InvalidNumParallel`] when a CPU multiple truncates
  /// to zero workers.
  pub fn resolve(self, unit_count: usize, cpus: usize) -> Result<usize, SelectError> {
    match self {
      Parallelism::All => Ok(unit_count.max(1)),
      Parallelism::Fixed(n) => Ok(n),
      Parallelism::PerCpu(factor) => {
        let workers = (cpus as f64 * factor).trunc() as usize;
        if workers < 1 {
          return Err(SelectError::InvalidNumParallel {
            value: format!("{factor}x"),
          });
        }
        Ok(workers)
      }
    }
  }
}

impl FromStr for Parallelism {
  type Err = SelectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let value = s.trim();
    let invalid = || SelectError::InvalidNumParallel { value: s.to_string() };

    if value.eq_ignore_ascii_case("all") {
      return Ok(Parallelism::All);
    }

    if let Some(factor) = value.strip_suffix(['x', 'X']) {
      let factor: f64 = factor.parse().map_err(|_| invalid())?;
      if !factor.is_finite() || factor <= 0.0 {
        return Err(invalid());
      }
      return Ok(Parallelism::PerCpu(factor));
    }

    match value.parse::<usize>() {
      Ok(n) if n >= 1 => Ok(Parallelism::Fixed(n)),
      _ => Err(invalid()),
    }
  }
}
