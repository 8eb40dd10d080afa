pub mod collection;
pub mod matcher;
pub mod organizer;
pub mod status;

pub use crate::domain::model::{Anime, Collection, ListStatus, ListStatusPayload, WatchStatus};
pub use crate::domain::ports::{AnimeTracker, ConfigProvider};
pub use crate::utils::error::Result;
