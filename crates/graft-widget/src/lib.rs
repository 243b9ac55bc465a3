pub mod config;
pub mod init;
pub mod styler;

pub use config::{WidgetConfig, CONTAINER_ID};
pub use init::{initialize, InitOutcome};
pub use styler::{StylerConfig, StylerState};
