use graft_detect::WatcherConfig;
use graft_script::FetcherConfig;
use graft_widget::StylerConfig;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct GraftConfig {
    pub browser: BrowserConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub inject: InjectConfig,
    #[serde(default)]
    pub styler: StylerSettings,
    pub cache: Option<CacheConfig>,
}

#[derive(Deserialize, Clone)]
pub struct BrowserConfig {
    pub ws_url: String,
    #[serde(default = "default_tab_poll_secs")]
    pub tab_poll_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct ScriptConfig {
    #[serde(default = "default_script_url")]
    pub url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            url: default_script_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_url_poll_interval_ms")]
    pub url_poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            url_poll_interval_ms: default_url_poll_interval_ms(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct InjectConfig {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct StylerSettings {
    #[serde(default = "default_styler_settle_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    #[serde(default = "default_interactive_delay_ms")]
    pub interactive_delay_ms: u64,
}

impl Default for StylerSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_styler_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            interactive_delay_ms: default_interactive_delay_ms(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
}

fn default_tab_poll_secs() -> u64 {
    2
}
fn default_script_url() -> String {
    graft_script::DEFAULT_SCRIPT_URL.to_string()
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1000
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_initial_delay_ms() -> u64 {
    500
}
fn default_url_poll_interval_ms() -> u64 {
    1500
}
fn default_settle_delay_ms() -> u64 {
    500
}
fn default_styler_settle_ms() -> u64 {
    2000
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_polls() -> u32 {
    10
}
fn default_interactive_delay_ms() -> u64 {
    1000
}
fn default_cache_path() -> String {
    "./graft-data/graft.db".to_string()
}

impl GraftConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            script_url: self.script.url.clone(),
            cache_ttl_ms: self.script.cache_ttl_secs as i64 * 1000,
            max_attempts: self.script.max_attempts,
            backoff_base_ms: self.script.backoff_base_ms,
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            debounce_ms: self.watch.debounce_ms,
            initial_delay_ms: self.watch.initial_delay_ms,
        }
    }

    pub fn styler_config(&self) -> StylerConfig {
        StylerConfig {
            settle_delay_ms: self.styler.settle_delay_ms,
            poll_interval_ms: self.styler.poll_interval_ms,
            max_polls: self.styler.max_polls,
            interactive_delay_ms: self.styler.interactive_delay_ms,
        }
    }
}
