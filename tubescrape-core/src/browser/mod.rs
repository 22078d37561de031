mod automation;
mod error;
mod page;

pub use automation::{BrowserLauncher, BrowserSession, LaunchOverrides};
pub use error::{BrowserError, BrowserResult};
pub use page::{BrowserChannelPage, ChannelPage, RawLink, RawTile};
