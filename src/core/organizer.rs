use crate::core::matcher::TitleMatcher;
use crate::core::status::{build_payload, parse_status};
use crate::domain::model::{Anime, Collection, ListStatus, ListStatusPayload};
use crate::domain::ports::AnimeTracker;
use crate::utils::error::{MalError, Result};
use crate::utils::progress::BatchProgress;
use std::future::Future;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// 單筆更新的結果
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated {
        anime: Anime,
        status: ListStatus,
    },
    /// dry-run 模式下只計算要送出的內容
    DryRun {
        anime: Anime,
        payload: ListStatusPayload,
    },
}

impl UpdateOutcome {
    pub fn anime(&self) -> &Anime {
        match self {
            UpdateOutcome::Updated { anime, .. } | UpdateOutcome::DryRun { anime, .. } => anime,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedAnime {
    pub name: String,
    pub outcome: UpdateOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpdate {
    pub name: String,
    pub reason: String,
}

/// 批次更新摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub total: usize,
    pub updated: Vec<UpdatedAnime>,
    pub not_updated: Vec<FailedUpdate>,
    pub interrupted: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.updated.len() + self.not_updated.len()
    }

    pub fn is_success(&self) -> bool {
        self.not_updated.is_empty() && !self.interrupted
    }
}

pub struct Organizer<T: AnimeTracker> {
    tracker: T,
    matcher: TitleMatcher,
    search_limit: usize,
    dry_run: bool,
    show_progress: bool,
}

impl<T: AnimeTracker> Organizer<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker,
            matcher: TitleMatcher::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            dry_run: false,
            show_progress: false,
        }
    }

    pub fn with_matcher(mut self, matcher: TitleMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_search_limit(mut self, search_limit: usize) -> Self {
        self.search_limit = search_limit;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// 搜尋並回傳最接近的結果，找不到時回傳 `None`
    pub async fn search_anime(&self, name: &str) -> Result<Option<Anime>> {
        tracing::debug!("Searching for '{}'", name);

        let results = self.tracker.search_anime(name, self.search_limit).await?;
        Ok(self.matcher.best_match(name, &results).cloned())
    }

    pub async fn get_anime(&self, anime_id: u64) -> Result<Anime> {
        self.tracker.get_anime(anime_id).await
    }

    /// 查詢清單上的狀態；名稱找不到對應作品時回傳 `AnimeNotFound`，不在清單上時回傳 `None`
    pub async fn get_anime_status(&self, name: &str) -> Result<Option<ListStatus>> {
        tracing::debug!("Getting status of '{}'", name);

        let anime = self
            .search_anime(name)
            .await?
            .ok_or_else(|| MalError::AnimeNotFound {
                name: name.to_string(),
            })?;
        self.tracker.get_list_status(anime.id).await
    }

    pub async fn get_anime_fields(&self, anime_id: u64, fields: &[&str]) -> Result<Anime> {
        self.tracker.get_anime_fields(anime_id, fields).await
    }

    pub async fn update_anime_status(&self, name: &str, status: &str) -> Result<UpdateOutcome> {
        tracing::debug!("Updating '{}' to '{}'", name, status);

        // 先解析狀態，格式錯誤時不必浪費一次搜尋
        let update = parse_status(status)?;

        let anime = self
            .search_anime(name)
            .await?
            .ok_or_else(|| MalError::AnimeNotFound {
                name: name.to_string(),
            })?;

        let payload = build_payload(&update, &anime)?;

        if self.dry_run {
            tracing::info!("[dry-run] Would update {} ({}) with {:?}", anime.title, anime.id, payload);
            return Ok(UpdateOutcome::DryRun { anime, payload });
        }

        tracing::info!("Updating {} ({}) with {:?}", anime.title, anime.id, payload);
        let status = self.tracker.update_list_status(anime.id, &payload).await?;
        Ok(UpdateOutcome::Updated { anime, status })
    }

    /// 依序更新整個清單，單筆失敗不會中斷批次。
    /// `shutdown` 完成時，進行中的那一筆會先完成並記錄，之後的項目不再處理
    pub async fn update_collection<F>(&self, collection: &Collection, shutdown: F) -> BatchReport
    where
        F: Future<Output = ()>,
    {
        tracing::debug!("Updating list of {} animes", collection.len());

        let mut report = BatchReport {
            total: collection.len(),
            ..Default::default()
        };
        let progress = BatchProgress::new(collection.len(), self.show_progress);
        tokio::pin!(shutdown);

        for (name, status) in collection {
            // 項目之間檢查中斷
            let stop = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if stop {
                report.interrupted = true;
                Self::log_interrupt(&progress, &report);
                break;
            }

            progress.start_item(name);

            let update = self.update_anime_status(name, status);
            tokio::pin!(update);
            let result = loop {
                tokio::select! {
                    biased;
                    result = &mut update => break result,
                    _ = &mut shutdown, if !report.interrupted => {
                        report.interrupted = true;
                        progress.println(&format!("Caught interrupt, finishing '{}' first", name));
                    }
                }
            };

            match result {
                Ok(outcome) => report.updated.push(UpdatedAnime {
                    name: name.clone(),
                    outcome,
                }),
                Err(e) => {
                    progress.suspend(|| tracing::warn!("'{}' couldn't be updated: {}", name, e));
                    report.not_updated.push(FailedUpdate {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            progress.finish_item();

            if report.interrupted {
                Self::log_interrupt(&progress, &report);
                break;
            }
        }

        progress.finish();
        tracing::info!(
            "Updated {} of {} animes, {} failed",
            report.updated.len(),
            report.total,
            report.not_updated.len()
        );

        report
    }

    fn log_interrupt(progress: &BatchProgress, report: &BatchReport) {
        progress.suspend(|| {
            tracing::warn!(
                "Batch interrupted after {} of {} items",
                report.processed(),
                report.total
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::WatchStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Clone, Default)]
    struct MockTracker {
        catalog: Vec<Anime>,
        failing_ids: Vec<u64>,
        updates: Arc<Mutex<HashMap<u64, ListStatusPayload>>>,
        // 收到更新請求時通知，並讓出一次執行權，模擬請求進行中
        update_started: Option<Arc<Notify>>,
    }

    impl MockTracker {
        fn new(titles: &[(u64, &str, u32)]) -> Self {
            let catalog = titles
                .iter()
                .map(|(id, title, num_episodes)| Anime {
                    id: *id,
                    title: title.to_string(),
                    num_episodes: *num_episodes,
                    media_type: Some("tv".to_string()),
                    alternative_titles: None,
                    my_list_status: None,
                })
                .collect();

            Self {
                catalog,
                ..Default::default()
            }
        }

        fn failing_on(mut self, id: u64) -> Self {
            self.failing_ids.push(id);
            self
        }

        fn notifying(mut self, notify: Arc<Notify>) -> Self {
            self.update_started = Some(notify);
            self
        }

        fn updates(&self) -> HashMap<u64, ListStatusPayload> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnimeTracker for MockTracker {
        async fn search_anime(&self, _query: &str, limit: usize) -> Result<Vec<Anime>> {
            Ok(self.catalog.iter().take(limit).cloned().collect())
        }

        async fn get_anime(&self, anime_id: u64) -> Result<Anime> {
            self.catalog
                .iter()
                .find(|a| a.id == anime_id)
                .cloned()
                .ok_or_else(|| MalError::HttpStatusError {
                    status: 404,
                    message: "not_found".to_string(),
                })
        }

        async fn get_list_status(&self, anime_id: u64) -> Result<Option<ListStatus>> {
            Ok(self.updates().get(&anime_id).map(|payload| ListStatus {
                status: payload.status,
                num_episodes_watched: payload.num_watched_episodes.unwrap_or(0),
                score: 0,
                is_rewatching: false,
                updated_at: None,
            }))
        }

        async fn update_list_status(&self, anime_id: u64, payload: &ListStatusPayload) -> Result<ListStatus> {
            if let Some(notify) = &self.update_started {
                notify.notify_one();
                tokio::task::yield_now().await;
            }

            if self.failing_ids.contains(&anime_id) {
                return Err(MalError::HttpStatusError {
                    status: 500,
                    message: "internal error".to_string(),
                });
            }

            self.updates.lock().unwrap().insert(anime_id, payload.clone());
            Ok(ListStatus {
                status: payload.status,
                num_episodes_watched: payload.num_watched_episodes.unwrap_or(0),
                score: 0,
                is_rewatching: false,
                updated_at: None,
            })
        }

        async fn get_anime_fields(&self, _anime_id: u64, _fields: &[&str]) -> Result<Anime> {
            Err(MalError::NotImplemented {
                operation: "get_anime_fields".to_string(),
            })
        }
    }

    fn catalog() -> MockTracker {
        MockTracker::new(&[
            (1, "Cowboy Bebop", 26),
            (33, "Berserk", 25),
            (19, "Monster", 74),
            (30, "Neon Genesis Evangelion", 26),
        ])
    }

    fn collection(items: &[(&str, &str)]) -> Collection {
        items
            .iter()
            .map(|(name, status)| (name.to_string(), status.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_search_anime_fuzzy() {
        let organizer = Organizer::new(catalog());

        let found = organizer.search_anime("Cowboy Bebopp").await.unwrap().unwrap();
        assert_eq!(found.id, 1);

        assert!(organizer.search_anime("Fullmetal Alchemist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_anime_status_unresolved_title() {
        let organizer = Organizer::new(catalog());

        let err = organizer
            .get_anime_status("Fullmetal Alchemist")
            .await
            .unwrap_err();
        assert!(matches!(err, MalError::AnimeNotFound { name } if name == "Fullmetal Alchemist"));

        // 找得到作品但不在清單上
        assert_eq!(organizer.get_anime_status("Berserk").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_anime_status() {
        let tracker = catalog();
        let organizer = Organizer::new(tracker.clone());

        let outcome = organizer
            .update_anime_status("Monster", "Watching - Ep.14")
            .await
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated { .. }));

        let status = organizer.get_anime_status("Monster").await.unwrap().unwrap();
        assert_eq!(status.status, Some(WatchStatus::Watching));
        assert_eq!(status.num_episodes_watched, 14);
    }

    #[tokio::test]
    async fn test_update_with_wrong_status_does_not_search() {
        let tracker = catalog();
        let organizer = Organizer::new(tracker.clone());

        let err = organizer
            .update_anime_status("Cowboy Bebop", "wrong_status")
            .await
            .unwrap_err();
        assert!(matches!(err, MalError::InvalidStatus { .. }));
        assert!(tracker.updates().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let tracker = catalog();
        let organizer = Organizer::new(tracker.clone()).with_dry_run(true);

        let outcome = organizer
            .update_anime_status("Cowboy Bebop", "completed")
            .await
            .unwrap();

        match outcome {
            UpdateOutcome::DryRun { anime, payload } => {
                assert_eq!(anime.id, 1);
                assert_eq!(payload.num_watched_episodes, Some(26));
            }
            other => panic!("expected dry run, got {:?}", other),
        }
        assert!(tracker.updates().is_empty());
    }

    #[tokio::test]
    async fn test_update_collection_records_failures() {
        let tracker = catalog().failing_on(19);
        let organizer = Organizer::new(tracker.clone());
        let items = collection(&[
            ("Cowboy Bebop", "completed"),
            ("Berserk", "Watching - Ep.3"),
            ("Monster", "dropped"),
            ("Fullmetal Alchemist", "completed"),
            ("Neon Genesis Evangelion", "rewatching"),
        ]);

        let report = organizer
            .update_collection(&items, std::future::pending())
            .await;

        assert_eq!(report.total, 5);
        assert!(!report.interrupted);
        assert_eq!(report.updated.len(), 2);

        let mut failed: Vec<&str> = report.not_updated.iter().map(|f| f.name.as_str()).collect();
        failed.sort();
        assert_eq!(failed, vec!["Fullmetal Alchemist", "Monster", "Neon Genesis Evangelion"]);

        let updates = tracker.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[&1].num_watched_episodes, Some(26));
        assert_eq!(updates[&33].num_watched_episodes, Some(3));
    }

    #[tokio::test]
    async fn test_update_collection_interrupted() {
        let tracker = catalog();
        let organizer = Organizer::new(tracker.clone());
        let items = collection(&[("Cowboy Bebop", "completed"), ("Berserk", "completed")]);

        let report = organizer.update_collection(&items, async {}).await;

        assert!(report.interrupted);
        assert_eq!(report.processed(), 0);
        assert!(!report.is_success());
        assert!(tracker.updates().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_during_update_keeps_in_flight_item() {
        let started = Arc::new(Notify::new());
        let tracker = catalog().notifying(started.clone());
        let organizer = Organizer::new(tracker.clone());
        let items = collection(&[("Berserk", "completed"), ("Cowboy Bebop", "completed")]);

        let shutdown = async move { started.notified().await };
        let report = organizer.update_collection(&items, shutdown).await;

        assert!(report.interrupted);
        assert_eq!(report.processed(), 1);
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].name, "Berserk");
        assert!(report.not_updated.is_empty());

        // 已送出的更新有被記錄，之後的項目沒有送出
        let updates = tracker.updates();
        assert_eq!(updates.len(), 1);
        assert!(updates.contains_key(&33));
    }

    #[tokio::test]
    async fn test_get_anime_fields_not_implemented() {
        let organizer = Organizer::new(catalog());
        let err = organizer.get_anime_fields(1, &["num_episodes"]).await.unwrap_err();
        assert!(matches!(err, MalError::NotImplemented { .. }));
    }
}
