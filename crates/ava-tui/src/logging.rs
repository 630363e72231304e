use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use anyhow::{Result, anyhow};
use ava_core::Config;
use env_logger::{Builder, Env, Target};

/// Send log output to a file; stderr belongs to the terminal UI.
///
/// `RUST_LOG` wins over the configured level. Returns the log file path.
pub fn init(config: &Config) -> Result<PathBuf> {
    let dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?
        .join("ava-chat");
    fs::create_dir_all(&dir)?;

    let path = dir.join("ava.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let level = config.log_level.as_deref().unwrap_or("info");
    Builder::from_env(Env::default().default_filter_or(level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    Ok(path)
}
