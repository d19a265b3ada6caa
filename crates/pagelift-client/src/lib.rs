pub mod cleaner;
pub mod fetcher;

pub use cleaner::HtmdCleaner;
pub use fetcher::ReqwestFetcher;
