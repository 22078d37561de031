use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_CHANNEL: &str = "https://www.youtube.com/@MrBeast/";
pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScraperConfig {
    pub target: TargetSection,
    pub chromium: ChromiumSection,
    pub flags: FlagsSection,
    pub waits: WaitsSection,
    pub pagination: PaginationSection,
    pub selectors: SelectorSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSection {
    /// Channel URL, `@handle` or bare handle.
    pub channel: String,
    pub base_url: String,
    pub title_suffix: String,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            title_suffix: " - YouTube".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromiumSection {
    pub executable_path: Option<String>,
    pub headless: bool,
    pub sandbox: bool,
    pub disable_gpu: bool,
    pub window_size: [u32; 2],
    pub request_timeout_seconds: Option<u64>,
}

impl Default for ChromiumSection {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: true,
            sandbox: true,
            disable_gpu: false,
            window_size: [1920, 1080],
            request_timeout_seconds: Some(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsSection {
    pub disable_blink_features: Vec<String>,
    /// Launch without `--enable-automation`.
    pub exclude_automation_switch: bool,
    pub hide_webdriver: bool,
    pub start_maximized: bool,
    pub lang: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for FlagsSection {
    fn default() -> Self {
        Self {
            disable_blink_features: vec!["AutomationControlled".to_string()],
            exclude_automation_switch: true,
            hide_webdriver: true,
            start_maximized: true,
            lang: Some("en-US".to_string()),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitsSection {
    /// Upper bound for a navigated page to reach `readyState == complete`.
    pub implicit_wait_ms: u64,
    /// Timeout for each individual channel-info field.
    pub field_wait_ms: u64,
    pub poll_interval_ms: u64,
    /// Upper bound for the first video tile to appear.
    pub tile_wait_ms: u64,
}

impl Default for WaitsSection {
    fn default() -> Self {
        Self {
            implicit_wait_ms: 10_000,
            field_wait_ms: 5_000,
            poll_interval_ms: 250,
            tile_wait_ms: 20_000,
        }
    }
}

impl WaitsSection {
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms)
    }

    pub fn field_wait(&self) -> Duration {
        Duration::from_millis(self.field_wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn tile_wait(&self) -> Duration {
        Duration::from_millis(self.tile_wait_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSection {
    pub max_attempts: usize,
    /// Consecutive non-growing scrolls tolerated before stopping.
    pub stall_limit: usize,
    pub settle_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            stall_limit: 2,
            settle_timeout_ms: 2_000,
            poll_interval_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSection {
    pub channel_name: Vec<String>,
    pub subscribers: Vec<String>,
    pub description: Vec<String>,
    pub stats: Vec<String>,
    /// Generic text elements scanned when a selector chain comes up empty.
    pub text_scan: String,
    pub tiles: TileSelectors,
}

impl Default for SelectorSection {
    fn default() -> Self {
        Self {
            channel_name: strings(&[
                "#text.ytd-channel-name",
                "yt-formatted-string#channel-name",
                "#channel-name yt-formatted-string",
                "ytd-channel-name yt-formatted-string",
                "ytd-c4-tabbed-header-renderer #channel-name",
                "#inner-header-container yt-formatted-string",
                "yt-dynamic-text-view-model h1",
            ]),
            subscribers: strings(&[
                "yt-formatted-string#subscriber-count",
                "#subscriber-count",
                "span#subscriber-count",
                "[aria-label*='subscriber']",
            ]),
            description: strings(&[
                "#description-container",
                "yt-attributed-string#description-container",
                "#description yt-formatted-string",
                "#about-container #description",
            ]),
            stats: strings(&["#videos-count", "td.ytd-about-channel-renderer"]),
            text_scan: "yt-formatted-string, span, td".to_string(),
            tiles: TileSelectors::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSelectors {
    pub container: String,
    /// Tried in order; the first element with text wins.
    pub title: Vec<String>,
    pub thumbnail_link: String,
    pub metadata_entries: String,
    pub duration: String,
}

impl Default for TileSelectors {
    fn default() -> Self {
        Self {
            container: "ytd-rich-grid-media".to_string(),
            title: strings(&["a#video-title-link", "#video-title", "a#video-title"]),
            thumbnail_link: "a#thumbnail".to_string(),
            metadata_entries: "#metadata-line span".to_string(),
            duration: "ytd-thumbnail-overlay-time-status-renderer #text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub directory: PathBuf,
    pub timestamp_format: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl OutputSection {
    /// Rejects strftime strings chrono cannot render, e.g. `%Q`.
    pub fn validate_timestamp_format(&self) -> std::result::Result<(), String> {
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(format!(
                "output.timestamp_format {:?} is not a valid strftime format",
                self.timestamp_format
            ));
        }
        Ok(())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn load_scraper_config<P: AsRef<Path>>(path: P) -> Result<ScraperConfig> {
    let path = path.as_ref();
    let config: ScraperConfig = load_toml(path)?;
    config
        .output
        .validate_timestamp_format()
        .map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_fixture_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../configs/scraper.toml");
        let config = load_scraper_config(path).expect("fixture should parse");
        assert_eq!(config.target.channel, DEFAULT_CHANNEL);
        assert_eq!(config.pagination.max_attempts, 10);
        assert!(config.selectors.tiles.title.len() >= 2);
        assert_eq!(config.output.timestamp_format, "%Y%m%d_%H%M%S");
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: ScraperConfig = toml::from_str(
            r#"
[pagination]
max_attempts = 25
"#,
        )
        .unwrap();
        assert_eq!(config.pagination.max_attempts, 25);
        assert_eq!(config.pagination.stall_limit, 2);
        assert_eq!(config.waits.implicit_wait_ms, 10_000);
        assert_eq!(config.selectors.tiles.container, "ytd-rich-grid-media");
    }

    #[test]
    fn bad_timestamp_format_is_rejected_on_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scraper.toml");
        std::fs::write(&path, "[output]\ntimestamp_format = \"%Y%m%d_%Q\"\n").unwrap();

        let err = load_scraper_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("%Y%m%d_%Q"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_scraper_config("/nonexistent/scraper.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scraper.toml"));
    }
}
