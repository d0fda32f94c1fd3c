use std::process::ExitCode;

use build::run_build;
use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use relreg_config::config::{default_config_path, generate_default_config, Config};
use relreg_core::BuildResult;
use relreg_operations::BuildOptions;
use tracing::info;
use utils::{COLOR, PROGRESS};

mod build;
mod cli;
mod logging;
mod progress;
mod serve;
mod utils;

async fn handle_cli() -> BuildResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        if let Ok(mut color) = COLOR.write() {
            *color = false;
        }
    }
    if args.no_progress || args.quiet || args.json {
        if let Ok(mut progress) = PROGRESS.write() {
            *progress = false;
        }
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);

    match args.command {
        Commands::Build {
            build,
        } => {
            let config = Config::load(&config_path)?;
            let options = build.apply(BuildOptions::from_config(&config)?);
            run_build(options)?;
        }
        Commands::Serve {
            build,
            skip_build,
            host,
            port,
        } => {
            let config = Config::load(&config_path)?;
            let options = build.apply(BuildOptions::from_config(&config)?);
            let host = host.unwrap_or_else(|| config.host().to_string());
            let port = port.unwrap_or_else(|| config.port());
            serve::serve(options, &host, port, skip_build).await?;
        }
        Commands::Config => {
            let config = Config::load(&config_path)?;
            info!("# {}", config_path.display());
            info!("{}", config.to_annotated_document()?);
        }
        Commands::DefConfig => {
            generate_default_config(&config_path)?;
            info!("Default config written to {}", config_path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match handle_cli().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}
