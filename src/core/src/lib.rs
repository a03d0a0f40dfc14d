pub mod config;
pub mod context;
pub mod errors;
pub mod logging;
pub mod time;

pub use config::Config;
pub use context::Context;
pub use errors::{Error, Result};
