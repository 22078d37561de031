use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::ChannelPage;
use crate::config::{ScraperConfig, SelectorSection};
use crate::error::ConfigError;
use crate::model::ChannelSummary;
use crate::text::{
    extract_subscriber_count, extract_video_count, mentions_count, normalize_ws,
    strip_title_suffix,
};

/// The channel being scraped, resolved from a URL, `@handle` or bare handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelTarget {
    pub handle: String,
    pub channel_url: String,
    pub about_url: String,
    pub videos_url: String,
}

impl ChannelTarget {
    pub fn parse(input: &str, base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Target {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty channel"));
        }

        let (origin, path) = if trimmed.starts_with("http://") || trimmed.starts_with("https://")
        {
            let url = Url::parse(trimmed).map_err(|err| invalid(&err.to_string()))?;
            let host = url.host_str().ok_or_else(|| invalid("url has no host"))?;
            let segments = url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).collect::<Vec<_>>())
                .unwrap_or_default();
            let path = match segments.as_slice() {
                [first, ..] if first.starts_with('@') => format!("/{first}"),
                ["channel" | "c" | "user", id, ..] => {
                    format!("/{}/{id}", segments[0])
                }
                _ => return Err(invalid("url does not point at a channel")),
            };
            (format!("{}://{host}", url.scheme()), path)
        } else {
            let handle = trimmed.trim_start_matches('@').trim_end_matches('/');
            if handle.is_empty()
                || handle.contains(['/', '?', '#'])
                || handle.contains(char::is_whitespace)
            {
                return Err(invalid("handle contains illegal characters"));
            }
            (base_url.trim_end_matches('/').to_string(), format!("/@{handle}"))
        };

        let handle = path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim_start_matches('@')
            .to_string();
        if handle.is_empty() {
            return Err(invalid("empty handle"));
        }
        let channel_url = format!("{origin}{path}");
        Ok(Self {
            handle,
            about_url: format!("{channel_url}/about"),
            videos_url: format!("{channel_url}/videos"),
            channel_url,
        })
    }
}

/// Summary plus the bookkeeping of what could not be read.
#[derive(Debug, Clone)]
pub struct ChannelExtraction {
    pub summary: ChannelSummary,
    pub missing: Vec<&'static str>,
    pub errors: Vec<String>,
}

/// Reads name, subscribers, description and video count off the about page.
///
/// Every field is attempted on its own; a field that cannot be read keeps
/// the [`crate::model::UNKNOWN`] sentinel and the next field is still attempted.
#[derive(Debug, Clone)]
pub struct ChannelInfoExtractor {
    selectors: SelectorSection,
    title_suffix: String,
    field_wait: Duration,
}

impl ChannelInfoExtractor {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            selectors: config.selectors.clone(),
            title_suffix: config.target.title_suffix.clone(),
            field_wait: config.waits.field_wait(),
        }
    }

    pub async fn extract<P>(
        &self,
        page: &mut P,
        target: &ChannelTarget,
        scraped_at: DateTime<Utc>,
    ) -> ChannelExtraction
    where
        P: ChannelPage + ?Sized,
    {
        let mut summary = ChannelSummary::unknown(&target.handle, &target.channel_url, scraped_at);
        let mut missing = Vec::new();
        let mut errors = Vec::new();

        info!(url = %target.about_url, "Opening channel about page");
        if let Err(err) = page.goto(&target.about_url).await {
            warn!(error = %err, "about page navigation failed");
            errors.push(format!("about page: {err}"));
        }

        match self.name(page, &mut errors).await {
            Some(name) => summary.name = name,
            None => missing.push("name"),
        }
        match self.subscribers(page, &mut errors).await {
            Some(subscribers) => summary.subscribers = subscribers,
            None => missing.push("subscribers"),
        }
        match self.description(page, &mut errors).await {
            Some(description) => summary.description = description,
            None => missing.push("description"),
        }
        match self.total_videos(page, &mut errors).await {
            Some(total) => summary.total_videos = total,
            None => missing.push("total_videos"),
        }

        info!(
            name = %summary.name,
            subscribers = %summary.subscribers,
            total_videos = %summary.total_videos,
            missing = missing.len(),
            "channel info extracted"
        );
        ChannelExtraction {
            summary,
            missing,
            errors,
        }
    }

    async fn name<P>(&self, page: &mut P, errors: &mut Vec<String>) -> Option<String>
    where
        P: ChannelPage + ?Sized,
    {
        let from_title = match page.title().await {
            Ok(title) => title.and_then(|t| strip_title_suffix(&t, &self.title_suffix)),
            Err(err) => {
                errors.push(format!("page title: {err}"));
                None
            }
        };
        if let Some(name) = &from_title {
            debug!(name = %name, "channel name from page title");
        }

        match self
            .first_in_chain(page, &self.selectors.channel_name, "channel name", errors)
            .await
        {
            Some(name) => Some(normalize_ws(&name)),
            None => from_title,
        }
    }

    async fn subscribers<P>(&self, page: &mut P, errors: &mut Vec<String>) -> Option<String>
    where
        P: ChannelPage + ?Sized,
    {
        let raw = match self
            .first_in_chain(page, &self.selectors.subscribers, "subscribers", errors)
            .await
        {
            Some(text) => Some(text),
            None => {
                self.scan_texts(page, "subscriber", errors, |text| Some(text.to_string()))
                    .await
            }
        }?;
        Some(extract_subscriber_count(&raw).unwrap_or_else(|| normalize_ws(&raw)))
    }

    async fn description<P>(&self, page: &mut P, errors: &mut Vec<String>) -> Option<String>
    where
        P: ChannelPage + ?Sized,
    {
        if let Some(text) = self
            .first_in_chain(page, &self.selectors.description, "description", errors)
            .await
        {
            return Some(text.trim().to_string());
        }
        match page.meta_content("description").await {
            Ok(content) => content,
            Err(err) => {
                errors.push(format!("description meta: {err}"));
                None
            }
        }
    }

    async fn total_videos<P>(&self, page: &mut P, errors: &mut Vec<String>) -> Option<String>
    where
        P: ChannelPage + ?Sized,
    {
        if let Some(text) = self
            .first_in_chain(page, &self.selectors.stats, "video count", errors)
            .await
        {
            if let Some(count) = extract_video_count(&text) {
                return Some(count);
            }
        }
        self.scan_texts(page, "video", errors, extract_video_count)
            .await
    }

    /// First selector in `chain` that yields text within the field wait.
    async fn first_in_chain<P>(
        &self,
        page: &mut P,
        chain: &[String],
        field: &str,
        errors: &mut Vec<String>,
    ) -> Option<String>
    where
        P: ChannelPage + ?Sized,
    {
        for selector in chain {
            match page.first_text(selector, self.field_wait).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    info!(field, selector = %selector, "found");
                    return Some(text);
                }
                Ok(_) => debug!(field, selector = %selector, "selector came up empty"),
                Err(err) => {
                    debug!(field, selector = %selector, error = %err, "selector lookup failed");
                    errors.push(format!("{field} ({selector}): {err}"));
                }
            }
        }
        None
    }

    /// Scans the generic text elements mentioning `keyword` with a number and
    /// returns the first one `accept` turns into a value.
    async fn scan_texts<P, F>(
        &self,
        page: &mut P,
        keyword: &str,
        errors: &mut Vec<String>,
        accept: F,
    ) -> Option<String>
    where
        P: ChannelPage + ?Sized,
        F: Fn(&str) -> Option<String>,
    {
        debug!(keyword, "falling back to text scan");
        match page.all_texts(&self.selectors.text_scan).await {
            Ok(texts) => texts
                .iter()
                .filter(|text| mentions_count(text, keyword))
                .find_map(|text| accept(text)),
            Err(err) => {
                errors.push(format!("text scan for {keyword}: {err}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.youtube.com";

    #[test]
    fn parses_full_channel_url() {
        let target = ChannelTarget::parse("https://www.youtube.com/@MrBeast/", BASE).unwrap();
        assert_eq!(target.handle, "MrBeast");
        assert_eq!(target.channel_url, "https://www.youtube.com/@MrBeast");
        assert_eq!(target.about_url, "https://www.youtube.com/@MrBeast/about");
        assert_eq!(target.videos_url, "https://www.youtube.com/@MrBeast/videos");
    }

    #[test]
    fn parses_url_with_tab_suffix() {
        let target = ChannelTarget::parse("https://youtube.com/@veritasium/videos", BASE).unwrap();
        assert_eq!(target.handle, "veritasium");
        assert_eq!(target.about_url, "https://youtube.com/@veritasium/about");
    }

    #[test]
    fn parses_legacy_channel_id() {
        let target =
            ChannelTarget::parse("https://www.youtube.com/channel/UCX6OQ3DkcsbYNE6H8uQQuVA", BASE)
                .unwrap();
        assert_eq!(target.handle, "UCX6OQ3DkcsbYNE6H8uQQuVA");
        assert_eq!(
            target.videos_url,
            "https://www.youtube.com/channel/UCX6OQ3DkcsbYNE6H8uQQuVA/videos"
        );
    }

    #[test]
    fn parses_handles_against_base() {
        let at = ChannelTarget::parse("@MrBeast", BASE).unwrap();
        let bare = ChannelTarget::parse("MrBeast", "https://www.youtube.com/").unwrap();
        assert_eq!(at, bare);
        assert_eq!(at.channel_url, "https://www.youtube.com/@MrBeast");
    }

    #[test]
    fn rejects_non_channel_inputs() {
        assert!(ChannelTarget::parse("", BASE).is_err());
        assert!(ChannelTarget::parse("@", BASE).is_err());
        assert!(ChannelTarget::parse("two words", BASE).is_err());
        assert!(ChannelTarget::parse("https://www.youtube.com/watch?v=abc", BASE).is_err());
    }
}
