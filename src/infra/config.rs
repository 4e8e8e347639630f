use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file names looked up in the current directory, first hit wins
const CONFIG_FILES: [&str; 2] = ["sdpgraph.toml", ".sdpgraph.toml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Worker threads for per-file tasks
    pub workers: usize,

    /// Nodes whose signature contains this text are dropped
    pub exclude_marker: String,

    /// Seconds after which a still-running task is reported as slow
    pub shutdown_grace_secs: u64,

    /// Emit seeds without edges as single-node groups
    pub keep_isolated: bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            workers: 10,
            exclude_marker: "test".to_string(),
            shutdown_grace_secs: 60,
            keep_isolated: false,
        }
    }
}

impl Config
{
    /// Render as TOML, e.g. to seed a config file
    pub fn to_toml(&self) -> Result<String>
    {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Load configuration from the current directory and environment
pub fn load_config() -> Result<Config>
{
    load_config_in(Path::new("."))
}

/// Load configuration: file in `dir` (if any), then `SDPGRAPH_*` variables
pub fn load_config_in(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Add environment variables with SDPGRAPH_ prefix
    builder = builder.add_source(config::Environment::with_prefix("SDPGRAPH").try_parsing(true));

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file()
    {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_in(dir.path()).unwrap();
        assert_eq!(cfg.workers, 10);
        assert_eq!(cfg.exclude_marker, "test");
        assert!(!cfg.keep_isolated);
    }

    #[test]
    fn file_overrides_some_keys()
    {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path()
                .join("sdpgraph.toml"),
            "workers = 3\nkeep_isolated = true\n",
        )
        .unwrap();

        let cfg = load_config_in(dir.path()).unwrap();

        assert_eq!(cfg.workers, 3);
        assert!(cfg.keep_isolated);
        assert_eq!(cfg.shutdown_grace_secs, 60);
    }

    #[test]
    fn toml_round_trips_defaults()
    {
        let text = Config::default()
            .to_toml()
            .unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }
}
