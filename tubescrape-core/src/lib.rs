pub mod browser;
pub mod channel;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pagination;
pub mod scraper;
pub mod text;
pub mod videos;

pub use browser::{
    BrowserChannelPage, BrowserError, BrowserLauncher, BrowserResult, BrowserSession, ChannelPage,
    LaunchOverrides, RawLink, RawTile,
};
pub use channel::{ChannelExtraction, ChannelInfoExtractor, ChannelTarget};
pub use config::{load_scraper_config, ScraperConfig};
pub use error::{ConfigError, Result};
pub use export::{ExportError, ExportOutcome, ExportResult, Exporter};
pub use model::{ChannelSummary, VideoRecord, NOT_AVAILABLE, UNKNOWN};
pub use pagination::{PaginationDriver, PaginationOutcome, StopReason};
pub use scraper::{ChannelScraper, ScrapeError, ScrapePipeline, ScrapeReport};
pub use videos::{TileBatch, TileError, VideoExtractor};
