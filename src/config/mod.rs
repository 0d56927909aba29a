//! Application configuration module
//!
//! Environment-driven settings and the fixed names of the bootstrap.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
