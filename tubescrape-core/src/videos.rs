use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{BrowserResult, ChannelPage, RawTile};
use crate::config::TileSelectors;
use crate::model::{VideoRecord, NOT_AVAILABLE};
use crate::text::{first_token, normalize_ws};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileError {
    #[error("no title element matched")]
    MissingTitle,
}

/// Records built from one sweep of the video grid.
///
/// `records.len() == tiles_seen - skipped` always holds.
#[derive(Debug, Clone, Default)]
pub struct TileBatch {
    pub records: Vec<VideoRecord>,
    pub tiles_seen: usize,
    pub skipped: usize,
    /// Records whose URL already appeared earlier in the sweep.
    pub duplicates: usize,
}

#[derive(Debug, Clone)]
pub struct VideoExtractor {
    selectors: TileSelectors,
    base_url: Option<Url>,
}

impl VideoExtractor {
    pub fn new(selectors: TileSelectors, base_url: &str) -> Self {
        Self {
            selectors,
            base_url: Url::parse(base_url).ok(),
        }
    }

    pub async fn extract<P>(&self, page: &mut P, channel_name: &str) -> BrowserResult<TileBatch>
    where
        P: ChannelPage + ?Sized,
    {
        let tiles = page.collect_tiles(&self.selectors).await?;
        info!(tiles = tiles.len(), "Found video tiles");
        Ok(self.build_batch(tiles, channel_name))
    }

    /// Converts every tile on its own; a tile that fails is dropped whole
    /// and the rest are still converted. Tiles sharing a URL are all kept
    /// and only tallied in `duplicates`.
    pub fn build_batch(&self, tiles: Vec<RawTile>, channel_name: &str) -> TileBatch {
        let mut batch = TileBatch {
            tiles_seen: tiles.len(),
            ..Default::default()
        };
        let mut seen_urls = HashSet::new();

        for (index, tile) in tiles.iter().enumerate() {
            let record = match self.build_record(tile, channel_name) {
                Ok(record) => record,
                Err(err) => {
                    warn!(tile = index + 1, error = %err, "skipping video tile");
                    batch.skipped += 1;
                    continue;
                }
            };
            if record.url != NOT_AVAILABLE && !seen_urls.insert(record.url.clone()) {
                debug!(tile = index + 1, url = %record.url, "url already seen in this sweep");
                batch.duplicates += 1;
            }
            debug!(
                tile = index + 1,
                title = %record.title,
                views = %record.views,
                upload_date = %record.upload_date,
                url = %record.url,
                "video extracted"
            );
            batch.records.push(record);
        }
        batch
    }

    pub fn build_record(
        &self,
        tile: &RawTile,
        channel_name: &str,
    ) -> Result<VideoRecord, TileError> {
        let link = tile
            .title_candidates
            .iter()
            .flatten()
            .find(|link| !link.text.trim().is_empty())
            .ok_or(TileError::MissingTitle)?;

        let url = link
            .href
            .as_deref()
            .filter(|href| !href.trim().is_empty())
            .or_else(|| {
                tile.thumbnail_href
                    .as_deref()
                    .filter(|href| !href.trim().is_empty())
            })
            .map(|href| self.absolutize(href))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        // Positional: entry 0 is the view count, entry 1 the upload date.
        let (views, upload_date) = match tile.metadata.as_slice() {
            [views, date, ..] => (
                first_token(views).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                non_empty(date),
            ),
            _ => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        let duration = tile
            .duration
            .as_deref()
            .map(non_empty)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(VideoRecord {
            channel_name: channel_name.to_string(),
            title: normalize_ws(&link.text),
            views,
            upload_date,
            duration,
            url,
        })
    }

    fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        match &self.base_url {
            Some(base) => base
                .join(href)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

fn non_empty(text: &str) -> String {
    let text = normalize_ws(text);
    if text.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::RawLink;

    fn extractor() -> VideoExtractor {
        VideoExtractor::new(TileSelectors::default(), "https://www.youtube.com")
    }

    fn link(text: &str, href: Option<&str>) -> Option<RawLink> {
        Some(RawLink {
            text: text.to_string(),
            href: href.map(str::to_string),
        })
    }

    #[test]
    fn first_candidate_with_text_wins() {
        let tile = RawTile {
            title_candidates: vec![None, link("  ", None), link("Real Title", Some("/watch?v=a"))],
            metadata: vec!["1.2M views".into(), "3 days ago".into()],
            duration: Some("12:34".into()),
            ..Default::default()
        };
        let record = extractor().build_record(&tile, "Chan").unwrap();
        assert_eq!(record.title, "Real Title");
        assert_eq!(record.url, "https://www.youtube.com/watch?v=a");
        assert_eq!(record.views, "1.2M");
        assert_eq!(record.upload_date, "3 days ago");
        assert_eq!(record.duration, "12:34");
        assert_eq!(record.channel_name, "Chan");
    }

    #[test]
    fn url_falls_back_to_thumbnail_then_sentinel() {
        let mut tile = RawTile {
            title_candidates: vec![link("Title", None)],
            thumbnail_href: Some("https://www.youtube.com/watch?v=b".into()),
            ..Default::default()
        };
        let record = extractor().build_record(&tile, "Chan").unwrap();
        assert_eq!(record.url, "https://www.youtube.com/watch?v=b");

        tile.thumbnail_href = None;
        let record = extractor().build_record(&tile, "Chan").unwrap();
        assert_eq!(record.url, NOT_AVAILABLE);
    }

    #[test]
    fn short_metadata_line_yields_sentinels() {
        let tile = RawTile {
            title_candidates: vec![link("Title", Some("/watch?v=c"))],
            metadata: vec!["5 views".into()],
            duration: None,
            ..Default::default()
        };
        let record = extractor().build_record(&tile, "Chan").unwrap();
        assert_eq!(record.views, NOT_AVAILABLE);
        assert_eq!(record.upload_date, NOT_AVAILABLE);
        assert_eq!(record.duration, NOT_AVAILABLE);
    }

    #[test]
    fn tile_without_title_is_rejected() {
        let tile = RawTile {
            title_candidates: vec![None, None],
            ..Default::default()
        };
        assert_eq!(
            extractor().build_record(&tile, "Chan"),
            Err(TileError::MissingTitle)
        );
    }

    #[test]
    fn repeated_urls_are_kept_and_tallied() {
        let first = RawTile {
            title_candidates: vec![link("Same", Some("/watch?v=d"))],
            ..Default::default()
        };
        let rerendered = RawTile {
            title_candidates: vec![link("Same again", Some("/watch?v=d"))],
            ..Default::default()
        };
        let other = RawTile {
            title_candidates: vec![link("Other", Some("/watch?v=e"))],
            ..Default::default()
        };
        let batch = extractor().build_batch(vec![first, rerendered, other], "Chan");
        assert_eq!(batch.tiles_seen, 3);
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.records.len(), batch.tiles_seen - batch.skipped);
        assert_eq!(batch.duplicates, 1);
    }
}
