use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::buffer::CACHE_SIZE;

/// Command line interface
#[derive(Debug, Parser)]
#[command(name = "sedit", version, about = "Edit large files through a bounded line window")]
pub struct Cli {
    /// File to edit (created on first save if it does not exist)
    pub file: PathBuf,

    /// Number of lines kept resident in memory
    #[arg(long, default_value_t = CACHE_SIZE)]
    pub cache_size: usize,

    /// Rows within which a new load request is merged into the one in flight
    #[arg(long)]
    pub tolerance: Option<usize>,

    /// How long a search match stays highlighted, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub highlight_ms: u64,

    /// Log file (defaults to sedit.log in the temp directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Keep a copy of the previous file contents as `<file>~` on save
    #[arg(long)]
    pub backup: bool,

    /// Refuse to scroll away from unsaved lines instead of saving them first
    #[arg(long)]
    pub no_save_before_reload: bool,
}

/// Runtime settings for a session
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_size: usize,
    pub tolerance: usize,
    pub highlight: Duration,
    pub save_before_reload: bool,
    pub backup: bool,
    pub log_file: PathBuf,
}

impl Config {
    pub fn default_log_file() -> PathBuf {
        std::env::temp_dir().join("sedit.log")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: CACHE_SIZE,
            tolerance: CACHE_SIZE / 4,
            highlight: Duration::from_millis(1000),
            save_before_reload: true,
            backup: false,
            log_file: Self::default_log_file(),
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        // A zero-line window could never hold the cursor
        let cache_size = cli.cache_size.max(1);
        Self {
            cache_size,
            tolerance: cli.tolerance.unwrap_or(cache_size / 4),
            highlight: Duration::from_millis(cli.highlight_ms),
            save_before_reload: !cli.no_save_before_reload,
            backup: cli.backup,
            log_file: cli
                .log_file
                .clone()
                .unwrap_or_else(Self::default_log_file),
        }
    }
}
