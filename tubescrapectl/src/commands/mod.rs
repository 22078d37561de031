pub mod scrape;

pub use scrape::ScrapeArgs;
