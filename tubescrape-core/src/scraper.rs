use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::browser::{BrowserError, BrowserLauncher, ChannelPage, LaunchOverrides};
use crate::channel::{ChannelInfoExtractor, ChannelTarget};
use crate::config::ScraperConfig;
use crate::error::ConfigError;
use crate::export::Exporter;
use crate::model::{ChannelSummary, VideoRecord};
use crate::pagination::{PaginationDriver, PaginationOutcome};
use crate::videos::{TileBatch, VideoExtractor};

/// The only failures that abort a run: a bad target or no browser.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid target: {0}")]
    Target(#[from] ConfigError),
    #[error("browser session unavailable: {0}")]
    Session(#[from] BrowserError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub target: ChannelTarget,
    pub summary: ChannelSummary,
    pub missing_fields: Vec<&'static str>,
    pub tiles_seen: usize,
    pub tiles_skipped: usize,
    pub duplicates: usize,
    pub videos_scraped: usize,
    pub pagination: PaginationOutcome,
    pub videos_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    #[serde(skip)]
    pub videos: Vec<VideoRecord>,
}

/// Steps 2 to 5 of a run against any [`ChannelPage`].
#[derive(Debug, Clone)]
pub struct ScrapePipeline {
    channel: ChannelInfoExtractor,
    pagination: PaginationDriver,
    videos: VideoExtractor,
    exporter: Exporter,
    tile_container: String,
    tile_wait: Duration,
}

impl ScrapePipeline {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            channel: ChannelInfoExtractor::new(config),
            pagination: PaginationDriver::new(&config.pagination),
            videos: VideoExtractor::new(config.selectors.tiles.clone(), &config.target.base_url),
            exporter: Exporter::new(&config.output),
            tile_container: config.selectors.tiles.container.clone(),
            tile_wait: config.waits.tile_wait(),
        }
    }

    pub async fn scrape<P>(
        &self,
        page: &mut P,
        target: &ChannelTarget,
        run_at: DateTime<Utc>,
    ) -> ScrapeReport
    where
        P: ChannelPage + ?Sized,
    {
        let started = Instant::now();

        let extraction = self.channel.extract(page, target, run_at).await;
        let mut errors = extraction.errors;
        let summary = extraction.summary;

        info!(url = %target.videos_url, "Opening channel videos page");
        if let Err(err) = page.goto(&target.videos_url).await {
            warn!(error = %err, "videos page navigation failed");
            errors.push(format!("videos page: {err}"));
        }
        match page
            .wait_for_selector(&self.tile_container, self.tile_wait)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(selector = %self.tile_container, "no video tiles appeared"),
            Err(err) => errors.push(format!("waiting for tiles: {err}")),
        }

        let pagination = self.pagination.run(page).await;
        if let Some(err) = &pagination.error {
            errors.push(format!("pagination: {err}"));
        }

        let batch = match self.videos.extract(page, &summary.name).await {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, "Error in video extraction");
                errors.push(format!("video extraction: {err}"));
                TileBatch::default()
            }
        };
        info!(
            videos = batch.records.len(),
            skipped = batch.skipped,
            duplicates = batch.duplicates,
            "video extraction finished"
        );

        let export = self.exporter.export(&summary, &batch.records, run_at);
        errors.extend(export.errors);

        ScrapeReport {
            target: target.clone(),
            summary,
            missing_fields: extraction.missing,
            tiles_seen: batch.tiles_seen,
            tiles_skipped: batch.skipped,
            duplicates: batch.duplicates,
            videos_scraped: batch.records.len(),
            pagination,
            videos_file: export.videos_file,
            summary_file: export.summary_file,
            errors,
            duration_ms: started.elapsed().as_millis() as u64,
            videos: batch.records,
        }
    }
}

/// Full run: launches chromium, scrapes one channel, always shuts down.
#[derive(Debug, Clone)]
pub struct ChannelScraper {
    config: Arc<ScraperConfig>,
    launcher: BrowserLauncher,
    pipeline: ScrapePipeline,
    overrides: LaunchOverrides,
}

impl ChannelScraper {
    pub fn new(config: ScraperConfig) -> Self {
        let config = Arc::new(config);
        Self {
            launcher: BrowserLauncher::new(Arc::clone(&config)),
            pipeline: ScrapePipeline::new(&config),
            config,
            overrides: LaunchOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: LaunchOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn target(&self) -> Result<ChannelTarget, ScrapeError> {
        Ok(ChannelTarget::parse(
            &self.config.target.channel,
            &self.config.target.base_url,
        )?)
    }

    pub async fn run(&self) -> Result<ScrapeReport, ScrapeError> {
        let target = self.target()?;
        let run_at = Utc::now();
        info!(channel = %target.channel_url, "Starting channel scrape");

        let session = self
            .launcher
            .launch_with_overrides(self.overrides.clone())
            .await?;
        let outcome = match session.open_page().await {
            Ok(mut page) => Ok(self.pipeline.scrape(&mut page, &target, run_at).await),
            Err(err) => Err(ScrapeError::Session(err)),
        };
        if let Err(err) = session.shutdown().await {
            warn!(error = %err, "browser shutdown reported an error");
        }
        outcome
    }
}
