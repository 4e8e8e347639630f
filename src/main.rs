use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use sdpgraph::cli::{AppContext, Cli};
use sdpgraph::core::{IdAllocator, RunOptions, pipeline};
use sdpgraph::infra::load_config;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Help and version print and exit 0; any other parse error exits 1
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Build a context once, pass everywhere
    let ctx = cli.context();
    init_logging(&ctx);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = load_config()?;
    cli.apply_overrides(&mut config);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        anyhow::bail!("--input is required");
    };

    let opts = RunOptions {
        input,
        working_dir: cli.working_directory.clone(),
        output: cli.output.clone(),
        config,
    };
    let ids = IdAllocator::new();
    pipeline::run(&opts, &ids)?;
    Ok(())
}

/// RUST_LOG wins; otherwise -v/--quiet pick the level
fn init_logging(ctx: &AppContext) {
    let default = match (ctx.quiet, ctx.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
