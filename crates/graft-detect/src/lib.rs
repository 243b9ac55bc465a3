pub mod sites;
pub mod watcher;

pub use sites::{detect, is_supported, is_valid_address, token_address};
pub use watcher::{watch_urls, WatcherConfig};
