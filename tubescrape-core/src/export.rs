use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{OutputSection, DEFAULT_TIMESTAMP_FORMAT};
use crate::model::{ChannelSummary, VideoRecord};
use crate::text::sanitize_filename_token;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error on {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("csv error on {path}: {source}")]
    Csv { source: csv::Error, path: PathBuf },
    #[error("timestamp format {format:?} cannot be rendered")]
    TimestampFormat { format: String },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Row layout of `channel_info_*.csv`.
#[derive(Debug, Serialize)]
struct ChannelInfoRow<'a> {
    channel_name: &'a str,
    channel_handle: &'a str,
    subscribers: &'a str,
    total_videos: &'a str,
    videos_scraped: usize,
    description: &'a str,
    scraped_at: String,
    channel_url: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportOutcome {
    pub videos_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
    timestamp_format: String,
}

impl Exporter {
    pub fn new(config: &OutputSection) -> Self {
        Self {
            directory: config.directory.clone(),
            timestamp_format: config.timestamp_format.clone(),
        }
    }

    /// `(videos, channel_info)` file names for a run. The stamp is rendered
    /// in UTC so names do not depend on the host time zone.
    pub fn file_names(
        &self,
        channel_name: &str,
        run_at: DateTime<Utc>,
    ) -> ExportResult<(String, String)> {
        let mut stamp = String::new();
        write!(stamp, "{}", run_at.format(&self.timestamp_format)).map_err(|_| {
            ExportError::TimestampFormat {
                format: self.timestamp_format.clone(),
            }
        })?;
        Ok(table_names(channel_name, &stamp))
    }

    /// Writes both tables. Never fails: problems are logged and returned in
    /// [`ExportOutcome::errors`]. The video table is skipped when empty; the
    /// summary table is always attempted.
    pub fn export(
        &self,
        summary: &ChannelSummary,
        videos: &[VideoRecord],
        run_at: DateTime<Utc>,
    ) -> ExportOutcome {
        let mut outcome = ExportOutcome::default();
        let (videos_name, summary_name) = match self.file_names(&summary.name, run_at) {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, fallback = DEFAULT_TIMESTAMP_FORMAT, "using default timestamp format");
                outcome.errors.push(err.to_string());
                let stamp = run_at.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
                table_names(&summary.name, &stamp)
            }
        };

        if let Err(err) = self.ensure_directory() {
            error!(error = %err, "cannot prepare output directory");
            outcome.errors.push(err.to_string());
        }

        if videos.is_empty() {
            warn!("No video data to save");
        } else {
            let path = self.directory.join(videos_name);
            match write_rows(&path, videos.iter()) {
                Ok(()) => {
                    info!(path = %path.display(), videos = videos.len(), "Video data saved");
                    outcome.videos_file = Some(path);
                }
                Err(err) => {
                    error!(error = %err, "Error saving video data");
                    outcome.errors.push(err.to_string());
                }
            }
        }

        let path = self.directory.join(summary_name);
        let row = ChannelInfoRow {
            channel_name: &summary.name,
            channel_handle: &summary.handle,
            subscribers: &summary.subscribers,
            total_videos: &summary.total_videos,
            videos_scraped: videos.len(),
            description: &summary.description,
            scraped_at: summary.scraped_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            channel_url: &summary.channel_url,
        };
        match write_rows(&path, std::iter::once(row)) {
            Ok(()) => {
                info!(path = %path.display(), "Channel info saved");
                outcome.summary_file = Some(path);
            }
            Err(err) => {
                error!(error = %err, "Error saving channel info");
                outcome.errors.push(err.to_string());
            }
        }
        outcome
    }

    fn ensure_directory(&self) -> ExportResult<()> {
        if self.directory.as_os_str().is_empty() || self.directory.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.directory).map_err(|source| ExportError::Io {
            source,
            path: self.directory.clone(),
        })
    }
}

fn table_names(channel_name: &str, stamp: &str) -> (String, String) {
    let token = sanitize_filename_token(channel_name);
    (
        format!("videos_{token}_{stamp}.csv"),
        format!("channel_info_{token}_{stamp}.csv"),
    )
}

fn write_rows<I, T>(path: &Path, rows: I) -> ExportResult<()>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let csv_err = |source| ExportError::Csv {
        source,
        path: path.to_path_buf(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        source,
        path: path.to_path_buf(),
    })
}
