use thiserror::Error;

pub type BrowserResult<T> = Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium launch failed: {0}")]
    Launch(String),
    #[error("cdp error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("invalid browser parameters: {0}")]
    Configuration(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("page script failed: {0}")]
    Evaluation(String),
    /// The CDP handler task panicked or was cancelled before shutdown joined it.
    #[error("browser handler task ended abnormally: {0}")]
    Handler(#[from] tokio::task::JoinError),
}
