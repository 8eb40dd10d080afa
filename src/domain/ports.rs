use crate::domain::model::{Anime, ListStatus, ListStatusPayload};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 動畫追蹤服務（MyAnimeList）的存取介面
#[async_trait]
pub trait AnimeTracker: Send + Sync {
    async fn search_anime(&self, query: &str, limit: usize) -> Result<Vec<Anime>>;
    async fn get_anime(&self, anime_id: u64) -> Result<Anime>;
    async fn get_list_status(&self, anime_id: u64) -> Result<Option<ListStatus>>;
    async fn update_list_status(&self, anime_id: u64, payload: &ListStatusPayload) -> Result<ListStatus>;
    async fn get_anime_fields(&self, anime_id: u64, fields: &[&str]) -> Result<Anime>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn client_id(&self) -> &str;
    fn access_token(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
}
