use clap::Parser;
use std::path::PathBuf;

use crate::infra::config::Config;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,  // global --quiet
    pub verbose: u8,  // -v count
}

#[derive(Parser, Debug)]
#[command(name = "sdpgraph")]
#[command(
    about = "Locate buggy Java methods by JVM long name and export their call neighborhoods as node/edge tables"
)]
#[command(version, long_about = None)]
pub struct Cli {
    /// Bug-record CSV, or a single .java file for prediction mode
    #[arg(short, long, required_unless_present = "print_config")]
    pub input: Option<PathBuf>,

    /// Directory the records' source paths are relative to
    #[arg(short = 'w', long, default_value = ".")]
    pub working_directory: PathBuf,

    /// Output directory for tables and snippet files
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Worker threads (overrides `workers` from config)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Drop nodes whose signature contains this text (empty disables)
    #[arg(long)]
    pub exclude_marker: Option<String>,

    /// Emit seeds without edges as single-node groups
    #[arg(long)]
    pub keep_isolated: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Only log warnings and errors
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }

    /// Layer command-line overrides on top of file/env configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(jobs) = self.jobs {
            config.workers = jobs;
        }
        if let Some(marker) = &self.exclude_marker {
            config.exclude_marker = marker.clone();
        }
        if self.keep_isolated {
            config.keep_isolated = true;
        }
    }
}
