//! String post-processing for text scraped off the channel pages.

use std::sync::OnceLock;

use regex::Regex;

fn subscriber_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d[\d.,]*\s*[kmb]?)\s*subscriber").expect("valid subscriber regex")
    })
}

fn video_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d[\d.,]*\s*[kmb]?)\s*videos?\b").expect("valid video regex"))
}

/// Isolates the `<number><unit>` part in front of "subscriber(s)".
///
/// `"1.2M subscribers watched this"` yields `"1.2m"`, `"12,345 subscribers"`
/// yields `"12,345"`.
pub fn extract_subscriber_count(text: &str) -> Option<String> {
    capture_count(subscriber_regex(), text)
}

/// Same as [`extract_subscriber_count`] for "N videos" stats lines.
pub fn extract_video_count(text: &str) -> Option<String> {
    capture_count(video_count_regex(), text)
}

fn capture_count(re: &Regex, text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    re.captures(&lowered)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<String>())
        .filter(|count| !count.is_empty())
}

/// True when `text` mentions `keyword` (case-insensitive) and holds a digit.
pub fn mentions_count(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(keyword) && text.chars().any(|c| c.is_ascii_digit())
}

/// Strips the site suffix from a document title, e.g. `"MrBeast - YouTube"`.
///
/// A title without the suffix is not a channel page (consent wall, error
/// page) and yields `None`. An empty suffix accepts any title.
pub fn strip_title_suffix(title: &str, suffix: &str) -> Option<String> {
    let head = if suffix.is_empty() {
        title
    } else {
        title.split_once(suffix)?.0
    };
    let head = head.trim();
    (!head.is_empty()).then(|| head.to_string())
}

/// First whitespace-separated token, e.g. `"1.2M views"` -> `"1.2M"`.
pub fn first_token(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_string)
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Filesystem-safe token: alphanumerics, space, `-` and `_` survive.
///
/// Trailing whitespace is dropped and an empty result becomes `channel`,
/// so applying it twice gives the same token.
pub fn sanitize_filename_token(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let token = kept.trim_end();
    if token.trim().is_empty() {
        "channel".to_string()
    } else {
        token.to_string()
    }
}
