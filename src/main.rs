//! tplcache - AngularJS template cache compiler.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Some(build_args) = cli.build_args() {
        tplcache::logger::set_verbose(build_args.verbose);
    }

    match &cli.command {
        Commands::Init { dry } => cli::init::init(&cli.config, *dry),
        Commands::Build { dry, .. } => cli::build::build(cli::load_config(&cli)?, *dry),
        Commands::Watch { build_args } => {
            cli::watch::watch(cli::load_config(&cli)?, build_args.overrides())
        }
        Commands::List { json } => cli::list::list(cli::load_config(&cli)?, *json),
    }
}
