use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::MalError;

/// 動畫名稱 -> 狀態字串，依名稱排序
pub type Collection = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 5] = [
        WatchStatus::Watching,
        WatchStatus::Completed,
        WatchStatus::OnHold,
        WatchStatus::Dropped,
        WatchStatus::PlanToWatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
            WatchStatus::OnHold => "on_hold",
            WatchStatus::Dropped => "dropped",
            WatchStatus::PlanToWatch => "plan_to_watch",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = MalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        WatchStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| MalError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

/// 觀看進度，例如 `S.2 Ep.14`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub season: Option<u32>,
    pub episode: u32,
}

/// 從狀態字串解析出的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: WatchStatus,
    pub progress: Option<Progress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternativeTitles {
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub ja: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStatus {
    pub status: Option<WatchStatus>,
    #[serde(default)]
    pub num_episodes_watched: u32,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub is_rewatching: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: u64,
    pub title: String,
    /// 0 表示集數未知（例如仍在播出）
    #[serde(default)]
    pub num_episodes: u32,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub alternative_titles: Option<AlternativeTitles>,
    #[serde(default)]
    pub my_list_status: Option<ListStatus>,
}

impl Anime {
    /// 主標題加上所有替代標題，用於模糊比對
    pub fn titles(&self) -> Vec<&str> {
        let mut titles = vec![self.title.as_str()];
        if let Some(alt) = &self.alternative_titles {
            titles.extend(alt.en.as_deref().filter(|t| !t.is_empty()));
            titles.extend(alt.ja.as_deref().filter(|t| !t.is_empty()));
            titles.extend(alt.synonyms.iter().map(String::as_str));
        }
        titles
    }
}

/// PATCH my_list_status 的表單內容
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListStatusPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WatchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_watched_episodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rewatching: Option<bool>,
}
