//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use tplcache::config::{CONFIG_FILE, Overrides};

/// Precompile HTML and SVG fragments into a $templateCache script
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: tplcache.toml)
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a starter tplcache.toml
    #[command(visible_alias = "i")]
    Init {
        /// Print the config to stdout instead of writing it
        #[arg(long)]
        dry: bool,
    },

    /// Compile every module and write the scripts
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Print asset paths and sizes without writing
        #[arg(long)]
        dry: bool,
    },

    /// Build, then rebuild whenever a template or the config changes
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Print resolved files and their cache keys
    #[command(visible_alias = "l")]
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

/// Shared arguments for Build and Watch
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Output directory (relative to the config file)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Register modules without dependencies (`angular.module(name, [])`)
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub standalone: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl BuildArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            output: self.output.clone(),
            standalone: self.standalone,
        }
    }
}

impl Cli {
    /// Build arguments of the active subcommand, if it takes any.
    pub const fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args, .. } | Commands::Watch { build_args } => Some(build_args),
            Commands::Init { .. } | Commands::List { .. } => None,
        }
    }
}
