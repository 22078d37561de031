use std::path::PathBuf;

use clap::Args;
use tubescrape_core::{LaunchOverrides, ScraperConfig};

/// Scrapes one channel's summary and video list into CSV files.
#[derive(Args, Debug, Clone, Default)]
pub struct ScrapeArgs {
    /// Channel URL, `@handle` or bare handle (defaults to `target.channel`)
    pub channel: Option<String>,

    /// Directory the CSV files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Shows the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Upper bound on scroll-to-bottom attempts
    #[arg(long, value_name = "N")]
    pub max_scrolls: Option<usize>,

    /// Consecutive unchanged heights that end scrolling
    #[arg(long, value_name = "N")]
    pub stall_limit: Option<usize>,
}

impl ScrapeArgs {
    /// Folds the flags into `config`; the headed flag travels as a launch override.
    pub fn apply(&self, config: &mut ScraperConfig) -> LaunchOverrides {
        if let Some(channel) = &self.channel {
            config.target.channel = channel.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(max) = self.max_scrolls {
            config.pagination.max_attempts = max;
        }
        if let Some(limit) = self.stall_limit {
            config.pagination.stall_limit = limit;
        }
        LaunchOverrides {
            headless: self.headed.then_some(false),
        }
    }
}
