pub mod commands;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tubescrape_core::{
    load_scraper_config, ChannelScraper, ScrapeReport, ScraperConfig, NOT_AVAILABLE,
};

pub use commands::ScrapeArgs;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] tubescrape_core::ConfigError),
    #[error("scrape failed: {0}")]
    Scrape(#[from] tubescrape_core::ScrapeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "YouTube channel scraper", long_about = None)]
pub struct Cli {
    /// Path to scraper.toml; built-in defaults are used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrapes a channel and writes the CSV tables
    Scrape(ScrapeArgs),
    /// Prints the effective configuration
    ShowConfig,
    /// Prints shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Logs go to stderr so `--format json` output stays parseable.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Scrape(args) => {
            let mut config = load_config(&cli)?;
            let overrides = args.apply(&mut config);
            let scraper = ChannelScraper::new(config).with_overrides(overrides);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(scraper.run())?;
            info!(
                videos = report.videos_scraped,
                errors = report.errors.len(),
                "scrape finished"
            );
            render(&report, cli.format)?;
        }
        Commands::ShowConfig => {
            let config = load_config(&cli)?;
            render(&config, cli.format)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(*shell, &mut command, name, &mut io::stdout());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ScraperConfig> {
    match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(load_scraper_config(path)?)
        }
        None => Ok(ScraperConfig::default()),
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

impl DisplayFallback for ScrapeReport {
    fn display(&self) -> String {
        let summary = &self.summary;
        let mut lines = vec![
            format!("Channel: {} (@{})", summary.name, summary.handle),
            format!("  - URL: {}", summary.channel_url),
            format!("  - Subscribers: {}", summary.subscribers),
            format!("  - Total videos: {}", summary.total_videos),
            format!("  - Description: {}", truncate(&summary.description, 80)),
        ];
        if !self.missing_fields.is_empty() {
            lines.push(format!("  - Missing: {}", self.missing_fields.join(", ")));
        }
        lines.push(format!(
            "Scrolling: {} attempts, stopped ({}) at height {}",
            self.pagination.attempts, self.pagination.stop_reason, self.pagination.final_height
        ));
        lines.push(format!(
            "Videos: {} scraped from {} tiles ({} skipped, {} duplicates)",
            self.videos_scraped, self.tiles_seen, self.tiles_skipped, self.duplicates
        ));
        for video in self.videos.iter().take(5) {
            let views = if video.views == NOT_AVAILABLE {
                "-"
            } else {
                video.views.as_str()
            };
            lines.push(format!("  - {} [{views}, {}]", video.title, video.upload_date));
        }
        if self.videos.len() > 5 {
            lines.push(format!("  ... and {} more", self.videos.len() - 5));
        }
        match &self.videos_file {
            Some(path) => lines.push(format!("Video table: {}", path.display())),
            None => lines.push("Video table: not written".to_string()),
        }
        match &self.summary_file {
            Some(path) => lines.push(format!("Channel table: {}", path.display())),
            None => lines.push("Channel table: not written".to_string()),
        }
        if !self.errors.is_empty() {
            lines.push(format!("Errors ({}):", self.errors.len()));
            for err in &self.errors {
                lines.push(format!("  - {err}"));
            }
        }
        lines.push(format!("Duration: {:.1} s", self.duration_ms as f64 / 1000.0));
        lines.join("\n")
    }
}

impl DisplayFallback for ScraperConfig {
    fn display(&self) -> String {
        let mut lines = vec![
            format!("Channel: {}", self.target.channel),
            format!("Base URL: {}", self.target.base_url),
            format!(
                "Chromium: headless={} sandbox={} window={}x{}",
                self.chromium.headless,
                self.chromium.sandbox,
                self.chromium.window_size[0],
                self.chromium.window_size[1]
            ),
        ];
        if let Some(path) = &self.chromium.executable_path {
            lines.push(format!("  - Executable: {path}"));
        }
        lines.push(format!(
            "Waits: implicit={}ms field={}ms tiles={}ms poll={}ms",
            self.waits.implicit_wait_ms,
            self.waits.field_wait_ms,
            self.waits.tile_wait_ms,
            self.waits.poll_interval_ms
        ));
        lines.push(format!(
            "Pagination: max_attempts={} stall_limit={} settle={}ms",
            self.pagination.max_attempts,
            self.pagination.stall_limit,
            self.pagination.settle_timeout_ms
        ));
        lines.push(format!("Tile container: {}", self.selectors.tiles.container));
        lines.push(format!("Output: {}", self.output.directory.display()));
        lines.join("\n")
    }
}

fn truncate(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_scrape_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tubescrapectl",
            "scrape",
            "@veritasium",
            "--output-dir",
            "out",
            "--headed",
            "--max-scrolls",
            "3",
            "--format",
            "json",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        let Commands::Scrape(args) = cli.command else {
            panic!("expected scrape command");
        };

        let mut config = ScraperConfig::default();
        let overrides = args.apply(&mut config);
        assert_eq!(config.target.channel, "@veritasium");
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.pagination.max_attempts, 3);
        assert_eq!(config.pagination.stall_limit, 2);
        assert_eq!(overrides.headless, Some(false));
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut config = ScraperConfig::default();
        let overrides = ScrapeArgs::default().apply(&mut config);
        assert_eq!(config.target.channel, tubescrape_core::config::DEFAULT_CHANNEL);
        assert_eq!(config.pagination.max_attempts, 10);
        assert_eq!(overrides.headless, None);
    }

    #[test]
    fn config_file_is_loaded_when_given() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scraper.toml");
        fs::write(&path, "[target]\nchannel = \"@somebody\"\n").unwrap();

        let cli = Cli::parse_from([
            "tubescrapectl",
            "--config",
            path.to_str().unwrap(),
            "show-config",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.target.channel, "@somebody");
        assert!(config.display().contains("Channel: @somebody"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["tubescrapectl", "--config", "/nonexistent/scraper.toml", "show-config"]);
        assert!(matches!(load_config(&cli), Err(AppError::Config(_))));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo", 2), "hé...");
    }
}
