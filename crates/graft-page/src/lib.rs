pub mod cdp;
pub mod context;
pub mod inject;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cdp::{attach, CdpPage};
pub use context::PageContext;
pub use inject::{inject, js_string, InjectOutcome};
