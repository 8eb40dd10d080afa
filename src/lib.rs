pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::MalClient;
pub use config::Settings;
pub use crate::core::{matcher::TitleMatcher, organizer::Organizer};
pub use utils::error::{MalError, Result};
