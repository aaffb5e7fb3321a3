use crate::commands::{self, ConvertArgs, InfoArgs, RestoreArgs};
use crate::error::{Error, Result};
use clap::CommandFactory;
use std::io::Write;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, clap::Parser)]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub subcommand: Option<Subcommands>,
    #[command(flatten)]
    pub convert: ConvertArgs,
    #[command(flatten)]
    pub globals: GlobalArgs,
}

#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Print debug information; can be repeated.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Do not print logs to console.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommands {
    /// Split 16-bit depth into the red and green channels of an RGBA PNG
    /// (assumed if no subcommand is specified).
    Convert(ConvertArgs),
    /// Rebuild raw16 files from converted PNGs.
    Restore(RestoreArgs),
    /// Print the header and depth range of raw16 files.
    Info(InfoArgs),
}

impl Args {
    pub fn run(self) -> Result<()> {
        match self.subcommand {
            Some(Subcommands::Convert(args)) => commands::convert(&args),
            Some(Subcommands::Restore(args)) => commands::restore(&args),
            Some(Subcommands::Info(args)) => commands::info(&args),
            None => commands::convert(&self.convert),
        }
    }
}

/// Prints the outcome of a run and picks the exit status.
///
/// Fatal errors go to `err` whether or not logging is enabled, so `-q` only
/// silences progress logs.
pub fn report(result: Result<()>, out: &mut impl Write, err: &mut impl Write) -> u8 {
    match result {
        Ok(()) => EXIT_SUCCESS,
        // Nothing to convert is not a failure.
        Err(Error::Usage) => {
            let _ = writeln!(out, "{}", Args::command().render_usage());
            EXIT_SUCCESS
        }
        Err(e) => {
            let _ = writeln!(err, "error: {e}");
            EXIT_FAILURE
        }
    }
}
