use crate::domain::model::{Anime, ListStatus, ListStatusPayload};
use crate::domain::ports::{AnimeTracker, ConfigProvider};
use crate::utils::error::{MalError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.myanimelist.net/v2";
pub const ANIME_FIELDS: &str = "id,title,num_episodes,media_type,alternative_titles,my_list_status";

/// MAL 不接受少於 3 個字元的搜尋
const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Deserialize)]
struct PagedResult {
    #[serde(default)]
    data: Vec<AnimeNode>,
}

#[derive(Debug, Deserialize)]
struct AnimeNode {
    node: Anime,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// MyAnimeList API v2 用戶端
#[derive(Debug, Clone)]
pub struct MalClient {
    client: Client,
    base_url: String,
    client_id: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl MalClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Self {
        tracing::debug!("Initializing MalClient for {}", config.api_base_url());

        Self {
            client: Client::new(),
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            client_id: config.client_id().to_string(),
            access_token: config.access_token().map(str::to_string),
            timeout: Duration::from_secs(config.timeout_seconds()),
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request
            .header("X-MAL-CLIENT-ID", &self.client_id)
            .timeout(self.timeout);

        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        request
    }

    fn require_token(&self) -> Result<()> {
        if self.access_token.is_none() {
            return Err(MalError::MissingConfigError {
                field: "access_token".to_string(),
            });
        }
        Ok(())
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .message
            .filter(|m| !m.is_empty())
            .or(body.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(MalError::HttpStatusError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AnimeTracker for MalClient {
    async fn search_anime(&self, query: &str, limit: usize) -> Result<Vec<Anime>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            tracing::warn!("Search query '{}' is too short, skipping request", query);
            return Ok(Vec::new());
        }

        tracing::debug!("Searching for '{}'", query);
        let limit = limit.to_string();
        let request = self.client.get(self.url("/anime")).query(&[
            ("q", query),
            ("limit", limit.as_str()),
            ("fields", ANIME_FIELDS),
        ]);

        let response = Self::check_status(self.authorize(request).send().await?).await?;
        let page: PagedResult = response.json().await?;
        tracing::debug!("Search for '{}' returned {} results", query, page.data.len());

        Ok(page.data.into_iter().map(|n| n.node).collect())
    }

    async fn get_anime(&self, anime_id: u64) -> Result<Anime> {
        tracing::debug!("Getting anime {}", anime_id);
        let request = self
            .client
            .get(self.url(&format!("/anime/{}", anime_id)))
            .query(&[("fields", ANIME_FIELDS)]);

        let response = Self::check_status(self.authorize(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_list_status(&self, anime_id: u64) -> Result<Option<ListStatus>> {
        // my_list_status 只有在使用者授權時才會回傳
        self.require_token()?;
        Ok(self.get_anime(anime_id).await?.my_list_status)
    }

    async fn update_list_status(&self, anime_id: u64, payload: &ListStatusPayload) -> Result<ListStatus> {
        self.require_token()?;
        tracing::debug!("Updating {} with {:?}", anime_id, payload);

        let request = self
            .client
            .patch(self.url(&format!("/anime/{}/my_list_status", anime_id)))
            .form(payload);

        let response = Self::check_status(self.authorize(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_anime_fields(&self, anime_id: u64, fields: &[&str]) -> Result<Anime> {
        tracing::debug!("Requested fields {:?} for {}", fields, anime_id);
        Err(MalError::NotImplemented {
            operation: "get_anime_fields".to_string(),
        })
    }
}
