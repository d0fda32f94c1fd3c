use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use relreg_operations::BuildOptions;

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Per-invocation overrides of the `[build]` configuration.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Root of the source dataset
    #[arg(required = false, short, long, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Directory the registry is generated into
    #[arg(required = false, short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Generate domains one after another
    #[arg(required = false, long)]
    pub sequential: bool,

    /// Number of worker threads for a parallel build
    #[arg(required = false, short, long)]
    pub workers: Option<usize>,
}

impl BuildArgs {
    pub fn apply(&self, mut options: BuildOptions) -> BuildOptions {
        if let Some(root) = &self.root {
            options.root = root.clone();
        }
        if let Some(output) = &self.output {
            options.output = output.clone();
        }
        if self.sequential {
            options.parallel = false;
        }
        if let Some(workers) = self.workers {
            options.max_workers = workers;
        }
        options
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the registry output tree
    #[clap(name = "build", visible_alias = "b")]
    Build {
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build, then serve the output tree over HTTP
    #[clap(name = "serve", visible_alias = "s")]
    Serve {
        #[command(flatten)]
        build: BuildArgs,

        /// Serve the existing output without rebuilding
        #[arg(required = false, long)]
        skip_build: bool,

        /// Address to listen on
        #[arg(required = false, long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(required = false, short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration
    Config,

    /// Generate a default config file
    #[clap(name = "defconfig")]
    DefConfig,
}
