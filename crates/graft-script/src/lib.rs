pub mod fetch;
pub mod store;

pub use fetch::{FetcherConfig, ScriptFetcher, DEFAULT_SCRIPT_URL};
pub use store::{MemoryStore, ScriptStore, SqliteStore};
