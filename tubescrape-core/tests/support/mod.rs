use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tubescrape_core::config::TileSelectors;
use tubescrape_core::{BrowserError, BrowserResult, ChannelPage, RawLink, RawTile, ScraperConfig};

/// In-memory channel page; selectors resolve through plain maps.
#[derive(Debug, Default)]
pub struct MockPage {
    pub title: Option<String>,
    pub texts: HashMap<String, String>,
    pub scan: Vec<String>,
    pub meta: HashMap<String, String>,
    /// Height reported after `n` scrolls is `heights[min(n, len - 1)]`.
    pub heights: Vec<u64>,
    pub fail_heights: bool,
    pub fail_goto: bool,
    pub fail_title: bool,
    /// Selectors whose `first_text` lookup errors instead of coming up empty.
    pub fail_selectors: HashSet<String>,
    pub fail_scan: bool,
    pub fail_meta: bool,
    pub fail_tiles: bool,
    pub tiles: Vec<RawTile>,
    pub scrolls: usize,
    pub visited: Vec<String>,
}

#[async_trait(?Send)]
impl ChannelPage for MockPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        self.visited.push(url.to_string());
        if self.fail_goto {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    async fn title(&mut self) -> BrowserResult<Option<String>> {
        if self.fail_title {
            return Err(script_failure("document.title"));
        }
        Ok(self.title.clone())
    }

    async fn first_text(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        if self.fail_selectors.contains(selector) {
            return Err(script_failure(selector));
        }
        Ok(self.texts.get(selector).cloned())
    }

    async fn all_texts(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        if self.fail_scan {
            return Err(script_failure(selector));
        }
        Ok(self.scan.clone())
    }

    async fn meta_content(&mut self, name: &str) -> BrowserResult<Option<String>> {
        if self.fail_meta {
            return Err(script_failure(name));
        }
        Ok(self.meta.get(name).cloned())
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> BrowserResult<bool> {
        Ok(!self.tiles.is_empty())
    }

    async fn scroll_height(&mut self) -> BrowserResult<u64> {
        if self.fail_heights {
            return Err(BrowserError::Evaluation("target closed".into()));
        }
        let Some(last) = self.heights.len().checked_sub(1) else {
            return Ok(0);
        };
        Ok(self.heights[self.scrolls.min(last)])
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.scrolls += 1;
        Ok(())
    }

    async fn collect_tiles(&mut self, selectors: &TileSelectors) -> BrowserResult<Vec<RawTile>> {
        if self.fail_tiles {
            return Err(script_failure(&selectors.container));
        }
        Ok(self.tiles.clone())
    }
}

fn script_failure(what: &str) -> BrowserError {
    BrowserError::Evaluation(format!("Execution context was destroyed while reading {what}"))
}

#[allow(dead_code)]
pub fn tile(title: &str, id: &str) -> RawTile {
    RawTile {
        title_candidates: vec![
            None,
            Some(RawLink {
                text: title.to_string(),
                href: Some(format!("/watch?v={id}")),
            }),
        ],
        thumbnail_href: Some(format!("/watch?v={id}")),
        metadata: vec!["1.5K views".into(), "2 days ago".into()],
        duration: Some("8:15".into()),
    }
}

#[allow(dead_code)]
pub fn malformed_tile() -> RawTile {
    RawTile {
        title_candidates: vec![None, None],
        thumbnail_href: Some("/watch?v=broken".into()),
        metadata: vec!["9 views".into(), "1 hour ago".into()],
        duration: None,
    }
}

/// Config with every wait collapsed so tests never sleep.
#[allow(dead_code)]
pub fn fast_config(output: &Path) -> ScraperConfig {
    let mut config = ScraperConfig::default();
    config.waits.field_wait_ms = 0;
    config.waits.poll_interval_ms = 1;
    config.waits.tile_wait_ms = 0;
    config.pagination.settle_timeout_ms = 0;
    config.pagination.poll_interval_ms = 0;
    config.output.directory = output.to_path_buf();
    config
}
