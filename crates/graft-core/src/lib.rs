mod error;
mod types;

pub use error::{GraftError, GraftResult};
pub use types::*;
