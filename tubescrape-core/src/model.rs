use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for channel fields that could not be extracted.
pub const UNKNOWN: &str = "Unknown";
/// Placeholder for video fields that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSummary {
    pub name: String,
    pub handle: String,
    pub subscribers: String,
    pub total_videos: String,
    pub description: String,
    pub channel_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl ChannelSummary {
    /// Summary with every extracted field set to the sentinel.
    pub fn unknown(handle: &str, channel_url: &str, scraped_at: DateTime<Utc>) -> Self {
        Self {
            name: UNKNOWN.to_string(),
            handle: handle.to_string(),
            subscribers: UNKNOWN.to_string(),
            total_videos: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            channel_url: channel_url.to_string(),
            scraped_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRecord {
    pub channel_name: String,
    pub title: String,
    pub views: String,
    pub upload_date: String,
    pub duration: String,
    pub url: String,
}
