//! Merging of declared units into a canonical unit list.
//!
//! Units may come from `buildPaths` (path only) or from `lambdas`/`units`
//! (path plus per-unit settings). Both lists are merged in that order, paths
//! are cleaned lexically, and each unit receives its effective build flags.

use std::collections::HashMap;

use tracing::debug;

use super::error::{ManifestError, UnitOrigin};
use super::types::{RawUnit, Unit};
use crate::flags;

/// Clean a declared unit path.
///
/// Trims surrounding whitespace, drops empty and `.` segments, resolves `..`
/// against preceding segments and strips trailing separators, so `./a/b`,
/// `a/b/`, `a//b` and `a/c/../b` all become `a/b`. A path that cleans down to
/// nothing becomes `.`.
///
/// Returns `None` when the trimmed input is empty.
pub fn normalize_path(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  let rooted = trimmed.starts_with('/');
  let mut segments: Vec<&str> = Vec::new();

  for segment in trimmed.split('/') {
    match segment {
      "" | "." => {}
      ".." => match segments.last() {
        Some(&last) if last != ".." => {
          segments.pop();
        }
        // `/..` is `/`
        _ if rooted => {}
        _ => segments.push(".."),
      },
      other => segments.push(other),
    }
  }

  let joined = segments.join("/");
  Some(if rooted {
    format!("/{joined}")
  } else if joined.is_empty() {
    ".".to_string()
  } else {
    joined
  })
}

/// Build the canonical unit list from both declaration styles.
///
/// `default_flags` is the manifest-level flag string, used by every unit that
/// does not declare its own. A unit declaring `buildFlags: ""` gets no flags.
/// `lookup` resolves variables referenced from flag strings.
///
/// # Errors
///
/// - [`ManifestError::EmptyPath`] for the first blank path
/// - [`ManifestError::DuplicatePaths`] listing every path declared more than once
/// - [`ManifestError::FlagSyntax`] when a flag string cannot be split
pub fn normalize_units<F>(
  build_paths: &[String],
  units: &[RawUnit],
  default_flags: Option<&str>,
  lookup: F,
) -> Result<Vec<Unit>, ManifestError>
where
  F: Fn(&str) -> Option<String>,
{
  let declared = build_paths
    .iter()
    .enumerate()
    .map(|(index, path)| (UnitOrigin::BuildPaths(index), path.as_str(), None, None))
    .chain(units.iter().enumerate().map(|(index, unit)| {
      (
        UnitOrigin::Units(index),
        unit.path.as_str(),
        unit.build_flags.as_deref(),
        unit.zipped_file_name.as_deref(),
      )
    }));

  let mut normalized = Vec::with_capacity(build_paths.len() + units.len());
  for (origin, raw_path, raw_flags, zipped_file_name) in declared {
    let path = normalize_path(raw_path).ok_or(ManifestError::EmptyPath { origin })?;
    debug!(%origin, raw = raw_path, path = %path, "normalized unit path");
    normalized.push((path, raw_flags, zipped_file_name));
  }

  check_duplicates(normalized.iter().map(|(path, _, _)| path.as_str()))?;

  let default_flags = match default_flags {
    Some(raw) => flags::expand(raw, &lookup).map_err(|source| ManifestError::FlagSyntax {
      unit: "default".to_string(),
      source,
    })?,
    None => Vec::new(),
  };

  normalized
    .into_iter()
    .map(|(path, raw_flags, zipped_file_name)| {
      let build_flags = match raw_flags {
        Some(raw) => flags::expand(raw, &lookup).map_err(|source| ManifestError::FlagSyntax {
          unit: path.clone(),
          source,
        })?,
        None => default_flags.clone(),
      };

      Ok(Unit {
        path,
        build_flags,
        zipped_file_name: zipped_file_name.filter(|name| !name.is_empty()).map(str::to_string),
      })
    })
    .collect()
}

fn check_duplicates<'a>(paths: impl Iterator<Item = &'a str>) -> Result<(), ManifestError> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  let mut duplicates = Vec::new();

  for path in paths {
    let count = counts.entry(path).or_default();
    *count += 1;
    if *count == 2 {
      duplicates.push(path.to_string());
    }
  }

  if duplicates.is_empty() {
    Ok(())
  } else {
    Err(ManifestError::DuplicatePaths { paths: duplicates })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn no_vars(_: &str) -> Option<String> {
    None
  }

  fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
  }

  fn raw_unit(path: &str, build_flags: Option<&str>) -> RawUnit {
    RawUnit {
      path: path.to_string(),
      build_flags: build_flags.map(str::to_string),
      zipped_file_name: None,
    }
  }

  // ==========================================================================
  // Path normalization
  // ==========================================================================

  #[test]
  fn normalize_path_cases() {
    let cases = [
      ("a/b", "a/b"),
      ("./a/b", "a/b"),
      ("a/b/", "a/b"),
      ("a//b", "a/b"),
      ("  a/b  ", "a/b"),
      ("a/c/../b", "a/b"),
      ("a/./b/.", "a/b"),
      ("../a", "../a"),
      ("a/../../b", "../b"),
      (".", "."),
      ("./", "."),
      ("a/..", "."),
      ("/abs/path/", "/abs/path"),
      ("/../a", "/a"),
    ];

    for (input, expected) in cases {
      assert_eq!(normalize_path(input).as_deref(), Some(expected), "input: {input:?}");
    }
  }

  #[test]
  fn normalize_path_rejects_blank() {
    assert_eq!(normalize_path(""), None);
    assert_eq!(normalize_path("   "), None);
  }

  // ==========================================================================
  // Merging and duplicates
  // ==========================================================================

  #[test]
  fn build_paths_come_before_units() {
    let units = normalize_units(
      &strings(&["lambdas/one", "./lambdas/two/"]),
      &[raw_unit("lambdas/three", None)],
      None,
      no_vars,
    )
    .unwrap();

    let paths: Vec<_> = units.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(paths, vec!["lambdas/one", "lambdas/two", "lambdas/three"]);
  }

  #[test]
  fn current_dir_prefix_is_a_duplicate() {
    let err = normalize_units(&strings(&["a/b", "./a/b"]), &[], None, no_vars).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicatePaths { ref paths } if paths == &["a/b"]));
  }

  #[test]
  fn trailing_separator_is_a_duplicate() {
    let err = normalize_units(&strings(&["a/b", "a/b/"]), &[], None, no_vars).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicatePaths { ref paths } if paths == &["a/b"]));
  }

  #[test]
  fn duplicates_across_styles_are_detected() {
    let err = normalize_units(&strings(&["a/b"]), &[raw_unit("a/c/../b", Some("-x"))], None, no_vars).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicatePaths { ref paths } if paths == &["a/b"]));
  }

  #[test]
  fn all_duplicates_are_reported_once() {
    let err = normalize_units(
      &strings(&["x", "y", "x/", "./y", "z", "./x"]),
      &[raw_unit("z", None)],
      None,
      no_vars,
    )
    .unwrap_err();

    assert!(matches!(err, ManifestError::DuplicatePaths { ref paths } if paths == &["x", "y", "z"]));
    assert_eq!(err.to_string(), "duplicate build paths after normalization: x, y, z");
  }

  #[test]
  fn empty_path_reports_origin() {
    let err = normalize_units(&strings(&["a", " "]), &[], None, no_vars).unwrap_err();
    assert!(matches!(
      err,
      ManifestError::EmptyPath {
        origin: UnitOrigin::BuildPaths(1)
      }
    ));

    let err = normalize_units(&[], &[raw_unit("a", None), raw_unit("", None)], None, no_vars).unwrap_err();
    assert!(matches!(
      err,
      ManifestError::EmptyPath {
        origin: UnitOrigin::Units(1)
      }
    ));
    assert_eq!(err.to_string(), "empty path declared at lambdas[1]");
  }

  // ==========================================================================
  // Flags
  // ==========================================================================

  #[test]
  fn units_inherit_default_flags() {
    let units = normalize_units(
      &strings(&["a"]),
      &[raw_unit("b", None)],
      Some(r#"-foo -bar "baz qux""#),
      no_vars,
    )
    .unwrap();

    for unit in &units {
      assert_eq!(unit.build_flags, vec!["-foo", "-bar", "baz qux"]);
    }
  }

  #[test]
  fn explicit_flags_override_default() {
    let units = normalize_units(&[], &[raw_unit("a", Some("-extra -stuff"))], Some("-default"), no_vars).unwrap();
    assert_eq!(units[0].build_flags, vec!["-extra", "-stuff"]);
  }

  #[test]
  fn explicit_empty_flags_disable_default() {
    let units = normalize_units(
      &[],
      &[raw_unit("none", Some("")), raw_unit("inherit", None)],
      Some("-default"),
      no_vars,
    )
    .unwrap();

    assert!(units[0].build_flags.is_empty());
    assert_eq!(units[1].build_flags, vec!["-default"]);
  }

  #[test]
  fn flags_expand_variables() {
    let lookup = |name: &str| (name == "TAGS").then(|| "lambda".to_string());
    let units = normalize_units(&strings(&["a"]), &[], Some("-tags $TAGS"), lookup).unwrap();
    assert_eq!(units[0].build_flags, vec!["-tags", "lambda"]);
  }

  #[test]
  fn default_flag_syntax_error_is_tagged_default() {
    let err = normalize_units(&strings(&["a"]), &[], Some("foo'"), no_vars).unwrap_err();
    match err {
      ManifestError::FlagSyntax { unit, source } => {
        assert_eq!(unit, "default");
        assert_eq!(source.input(), "foo'");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn unit_flag_syntax_error_is_tagged_with_unit() {
    let err = normalize_units(&[], &[raw_unit("./lambdas/bad/", Some("\"open"))], None, no_vars).unwrap_err();
    assert!(matches!(err, ManifestError::FlagSyntax { ref unit, .. } if unit == "lambdas/bad"));
  }

  #[test]
  fn zipped_file_name_override_is_kept() {
    let mut unit = raw_unit("a", None);
    unit.zipped_file_name = Some("bootstrap".to_string());
    let mut blank = raw_unit("b", None);
    blank.zipped_file_name = Some(String::new());

    let units = normalize_units(&[], &[unit, blank], None, no_vars).unwrap();
    assert_eq!(units[0].zipped_file_name.as_deref(), Some("bootstrap"));
    assert_eq!(units[1].zipped_file_name, None);
  }
}
