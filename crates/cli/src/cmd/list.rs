//! Implementation of the `lambgo list` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use crate::output::{print_info, print_json, print_stat};

pub fn cmd_list(json: bool) -> Result<()> {
  let config = super::resolve_config()?;

  if json {
    return print_json(&config);
  }

  print_info(&format!("Module {}", config.module_path));
  print_stat("Root", &config.root_path.display().to_string());
  print_stat("Target", &format!("{}/{}", config.target_os, config.target_arch));
  print_stat("Output", &config.out_directory);
  println!();

  if config.units.is_empty() {
    println!("No Lambdas declared.");
    return Ok(());
  }

  for unit in &config.units {
    if unit.build_flags.is_empty() {
      println!("  {}", unit.path);
    } else {
      println!(
        "  {} {}",
        unit.path,
        unit
          .build_flags
          .join(" ")
          .if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }

  Ok(())
}
