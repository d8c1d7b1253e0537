mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::print_error;

/// lambgo - Build and zip Go Lambda functions in parallel
#[derive(Parser)]
#[command(name = "lambgo")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build and zip every Lambda declared in .lambgo.yml
  Build {
    /// Only build this Lambda path; a trailing '/' selects every Lambda below it
    #[arg(long = "only", value_name = "PATH")]
    only: Vec<String>,

    /// Parallel builds: 'all', a fixed count, or a multiple of the CPU count such as '1.5x'
    #[arg(long, default_value = "all", value_name = "N")]
    num_parallel: String,

    /// Build one Lambda at a time; --num-parallel is ignored
    #[arg(long)]
    disable_parallel: bool,
  },

  /// List the Lambdas that would be built
  List {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
  },

  /// Write an example .lambgo.yml into the project root
  Init,
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Build {
      only,
      num_parallel,
      disable_parallel,
    } => cmd::cmd_build(&only, &num_parallel, disable_parallel, cli.verbose),
    Commands::List { json } => cmd::cmd_list(json),
    Commands::Init => cmd::cmd_init(),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&output::error_chain(&e));
      ExitCode::FAILURE
    }
  }
}
