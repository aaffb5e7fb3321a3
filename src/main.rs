mod chunk;
mod cli;
mod commands;
mod error;
mod img;
mod png;
mod raw16;
mod util;

use clap::Parser;
use cli::Args;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    if !args.globals.quiet {
        let filter = match args.globals.verbose {
            0 => tracing::level_filters::LevelFilter::INFO,
            1 => tracing::level_filters::LevelFilter::DEBUG,
            2.. => tracing::level_filters::LevelFilter::TRACE,
        };
        let env_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(filter.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
    }

    let status = cli::report(args.run(), &mut std::io::stdout(), &mut std::io::stderr());
    ExitCode::from(status)
}
