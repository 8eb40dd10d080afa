use crate::domain::model::{Anime, ListStatusPayload, Progress, StatusUpdate, WatchStatus};
use crate::utils::error::{MalError, Result};
use regex::Regex;
use std::sync::LazyLock;

pub const EPISODE: &str = "Ep.";

const STATUS_SEPARATOR: &str = " - ";

static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:S\.\s*(\d+)\s+)?Ep\.\s*(\d+)$").expect("valid progress regex"));

static LIST_STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+) - (S\.\d+ )?Ep\.(\d+)?").expect("valid list status regex"));

/// 解析狀態字串，例如 `Watching - S.2 Ep.14` 或 `completed`
pub fn parse_status(text: &str) -> Result<StatusUpdate> {
    tracing::debug!("Parsing status '{}'", text);

    let (status_part, progress_part) = match text.split_once(STATUS_SEPARATOR) {
        Some((status, progress)) => (status, Some(progress)),
        None => (text, None),
    };

    let status: WatchStatus = status_part.parse()?;
    let progress = progress_part
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(parse_progress)
        .transpose()?;

    Ok(StatusUpdate { status, progress })
}

/// 解析 `Ep.M` 或 `S.N Ep.M`
pub fn parse_progress(text: &str) -> Result<Progress> {
    let invalid = || MalError::InvalidProgress {
        progress: text.to_string(),
    };

    let caps = PROGRESS_RE.captures(text.trim()).ok_or_else(invalid)?;
    let season = caps
        .get(1)
        .map(|m| m.as_str().parse::<u32>())
        .transpose()
        .map_err(|_| invalid())?;
    let episode = caps[2].parse::<u32>().map_err(|_| invalid())?;

    Ok(Progress { season, episode })
}

/// 依狀態與動畫資料產生要送出的欄位
pub fn build_payload(update: &StatusUpdate, anime: &Anime) -> Result<ListStatusPayload> {
    let mut payload = ListStatusPayload {
        status: Some(update.status),
        ..Default::default()
    };

    match update.status {
        WatchStatus::Completed => {
            if anime.num_episodes > 0 {
                payload.num_watched_episodes = Some(anime.num_episodes);
            }
        }
        WatchStatus::Watching => {
            let progress = update.progress.ok_or_else(|| MalError::MissingEpisode {
                status: update.status.to_string(),
            })?;
            payload.num_watched_episodes = Some(cap_episode(progress.episode, anime));
        }
        _ => {
            if let Some(progress) = update.progress {
                payload.num_watched_episodes = Some(cap_episode(progress.episode, anime));
            }
        }
    }

    if let Some(Progress {
        season: Some(season),
        ..
    }) = update.progress
    {
        tracing::debug!("'{}' progress refers to season {}", anime.title, season);
    }

    Ok(payload)
}

fn cap_episode(episode: u32, anime: &Anime) -> u32 {
    if anime.num_episodes > 0 && episode > anime.num_episodes {
        tracing::warn!(
            "'{}' has {} episodes, capping progress of {} at {}",
            anime.title,
            anime.num_episodes,
            episode,
            anime.num_episodes
        );
        anime.num_episodes
    } else {
        episode
    }
}

/// 清單文字檔中狀態欄位的正規化
pub fn normalize_list_status(raw: &str) -> String {
    match LIST_STATUS_RE.captures(raw) {
        Some(caps) => {
            let mut status = caps[1].to_string();
            if let Some(episode) = caps.get(3) {
                let season = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                status.push_str(&format!("{}{}{}{}", STATUS_SEPARATOR, season, EPISODE, episode.as_str()));
            }
            status
        }
        None => raw.to_string(),
    }
}
