use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::config::TileSelectors;

use super::error::{BrowserError, BrowserResult};

/// A link-ish element inside a video tile.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawLink {
    #[serde(default)]
    pub text: String,
    pub href: Option<String>,
}

/// Everything the DOM sweep reads from one video tile, before any fallback
/// logic is applied. `title_candidates` lines up with
/// [`TileSelectors::title`]; a `None` entry means that selector matched
/// nothing inside the tile.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawTile {
    #[serde(default)]
    pub title_candidates: Vec<Option<RawLink>>,
    pub thumbnail_href: Option<String>,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub duration: Option<String>,
}

/// The slice of a rendered channel page the extractors need.
///
/// Lookups report absence as `Ok(None)` / empty collections; `Err` is kept
/// for failures of the page itself (dead target, script exception).
#[async_trait(?Send)]
pub trait ChannelPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()>;
    async fn title(&mut self) -> BrowserResult<Option<String>>;
    /// Polls until `selector` matches an element with non-empty text or
    /// `timeout` elapses.
    async fn first_text(&mut self, selector: &str, timeout: Duration)
        -> BrowserResult<Option<String>>;
    async fn all_texts(&mut self, selector: &str) -> BrowserResult<Vec<String>>;
    async fn meta_content(&mut self, name: &str) -> BrowserResult<Option<String>>;
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> BrowserResult<bool>;
    async fn scroll_height(&mut self) -> BrowserResult<u64>;
    async fn scroll_to_bottom(&mut self) -> BrowserResult<()>;
    async fn collect_tiles(&mut self, selectors: &TileSelectors) -> BrowserResult<Vec<RawTile>>;
}

/// [`ChannelPage`] backed by a live chromium tab.
#[derive(Debug)]
pub struct BrowserChannelPage {
    page: Page,
    poll_interval: Duration,
    load_timeout: Duration,
}

impl BrowserChannelPage {
    pub(crate) fn new(page: Page, poll_interval: Duration, load_timeout: Duration) -> Self {
        Self {
            page,
            poll_interval,
            load_timeout,
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> BrowserResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|err| BrowserError::Evaluation(err.to_string()))?
            .into_value()
            .map_err(|err| BrowserError::Evaluation(format!("failed to decode payload: {err}")))
    }

    async fn wait_ready(&self) -> BrowserResult<()> {
        let deadline = Instant::now() + self.load_timeout;
        loop {
            let state: String = self.eval("document.readyState").await?;
            if state == "complete" {
                return Ok(());
            }
            if Instant::now() >= deadline {
                trace!(state = %state, "document still loading after timeout");
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait(?Send)]
impl ChannelPage for BrowserChannelPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Configuration)?;
        self.page
            .goto(params)
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        self.wait_ready().await
    }

    async fn title(&mut self) -> BrowserResult<Option<String>> {
        Ok(self.page.get_title().await?)
    }

    async fn first_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<Option<String>> {
        let script = first_text_script(selector)?;
        let deadline = Instant::now() + timeout;
        loop {
            let text: String = self.eval(&script).await?;
            if !text.is_empty() {
                return Ok(Some(text));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn all_texts(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => (el.innerText || el.textContent || '').trim()).filter(Boolean)",
            sel = js_string(selector)?
        );
        self.eval(&script).await
    }

    async fn meta_content(&mut self, name: &str) -> BrowserResult<Option<String>> {
        let selector = format!("meta[name=\"{name}\"]");
        let script = format!(
            "((document.querySelector({sel}) || {{}}).content || '').trim()",
            sel = js_string(&selector)?
        );
        let content: String = self.eval(&script).await?;
        Ok((!content.is_empty()).then_some(content))
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> BrowserResult<bool> {
        let script = format!(
            "document.querySelector({sel}) !== null",
            sel = js_string(selector)?
        );
        let deadline = Instant::now() + timeout;
        loop {
            let present: bool = self.eval(&script).await?;
            if present {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn scroll_height(&mut self) -> BrowserResult<u64> {
        let height: f64 = self.eval("document.documentElement.scrollHeight").await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        let _: bool = self
            .eval("(() => { window.scrollTo(0, document.documentElement.scrollHeight); return true; })()")
            .await?;
        Ok(())
    }

    async fn collect_tiles(&mut self, selectors: &TileSelectors) -> BrowserResult<Vec<RawTile>> {
        let script = tile_sweep_script(selectors)?;
        self.eval(&script).await
    }
}

fn js_string(value: &str) -> BrowserResult<String> {
    serde_json::to_string(value).map_err(|err| BrowserError::Configuration(err.to_string()))
}

fn first_text_script(selector: &str) -> BrowserResult<String> {
    Ok(format!(
        "(() => {{ const el = document.querySelector({sel}); return el ? (el.innerText || el.textContent || '').trim() : ''; }})()",
        sel = js_string(selector)?
    ))
}

fn tile_sweep_script(selectors: &TileSelectors) -> BrowserResult<String> {
    let titles = serde_json::to_string(&selectors.title)
        .map_err(|err| BrowserError::Configuration(err.to_string()))?;
    Ok(format!(
        r#"
(() => {{
    const text = (el) => el ? (el.innerText || el.textContent || '').trim() : '';
    const href = (el) => el ? (el.href || el.getAttribute('href') || null) : null;
    const titleSelectors = {titles};
    return Array.from(document.querySelectorAll({container})).map(tile => {{
        const titleCandidates = titleSelectors.map(sel => {{
            const el = tile.querySelector(sel);
            return el ? {{ text: text(el), href: href(el) }} : null;
        }});
        const duration = tile.querySelector({duration});
        return {{
            title_candidates: titleCandidates,
            thumbnail_href: href(tile.querySelector({thumbnail})),
            metadata: Array.from(tile.querySelectorAll({metadata})).map(text),
            duration: duration ? text(duration) : null
        }};
    }});
}})()
"#,
        titles = titles,
        container = js_string(&selectors.container)?,
        duration = js_string(&selectors.duration)?,
        thumbnail = js_string(&selectors.thumbnail_link)?,
        metadata = js_string(&selectors.metadata_entries)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_embedded_as_js_literals() {
        let script = first_text_script("a[title='x \"y\"']").unwrap();
        assert!(script.contains(r#"document.querySelector("a[title='x \"y\"']")"#));
    }

    #[test]
    fn tile_sweep_lists_title_candidates_in_order() {
        let selectors = TileSelectors::default();
        let script = tile_sweep_script(&selectors).unwrap();
        assert!(script.contains(r##"["a#video-title-link","#video-title","a#video-title"]"##));
        assert!(script.contains(r#"document.querySelectorAll("ytd-rich-grid-media")"#));
    }

    #[test]
    fn raw_tile_decodes_sparse_payload() {
        let tile: RawTile = serde_json::from_value(serde_json::json!({
            "title_candidates": [null, { "text": "Clip", "href": "/watch?v=1" }],
            "thumbnail_href": null,
            "duration": null
        }))
        .unwrap();
        assert_eq!(tile.title_candidates.len(), 2);
        assert!(tile.title_candidates[0].is_none());
        assert!(tile.metadata.is_empty());
    }
}
