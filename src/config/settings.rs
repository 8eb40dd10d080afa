use crate::adapters::mal_client::DEFAULT_BASE_URL;
use crate::core::matcher::{DEFAULT_CUTOFF, DEFAULT_MAX_CANDIDATES};
use crate::core::organizer::DEFAULT_SEARCH_LIMIT;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MalError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const APP_NAME: &str = "mal-organizer";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_CLIENT_ID: &str = "MAL_CLIENT_ID";
pub const ENV_ACCESS_TOKEN: &str = "MAL_ACCESS_TOKEN";
pub const ENV_API_URL: &str = "MAL_API_URL";

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub matching: MatchingSettings,
    pub update: UpdateSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub client_id: String,
    pub access_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            access_token: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub cutoff: f64,
    pub max_candidates: usize,
    pub search_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    pub dry_run: bool,
    pub show_progress: bool,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            show_progress: true,
        }
    }
}

/// 預設設定檔位置：`<config_dir>/mal-organizer/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME)
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MalError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MAL_CLIENT_ID})
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 載入設定檔。未指定路徑且預設檔不存在時，建立一份預設設定檔
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_dotenv(path, None)
    }

    /// 先讀取 .env（預設為目前目錄往上找），設定檔中的 ${VAR} 才能使用其中的值
    pub fn load_with_dotenv(path: Option<&Path>, dotenv_file: Option<&Path>) -> Result<Self> {
        load_dotenv(dotenv_file);

        let settings = match path {
            Some(path) => {
                tracing::debug!("Loading user configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let path = default_config_path();
                if !path.is_file() {
                    tracing::warn!(
                        "Configuration file doesn't exist. Creating configuration file at {}",
                        path.display()
                    );
                    Self::create_default_file(&path)?;
                }
                tracing::debug!("Loading user configuration from {}", path.display());
                Self::from_file(&path)?
            }
        };

        Ok(settings.with_env_overrides())
    }

    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut defaults = Settings::default();
        defaults.api.client_id = format!("${{{}}}", ENV_CLIENT_ID);
        let content = toml::to_string_pretty(&defaults).map_err(|e| MalError::ConfigError {
            message: format!("TOML serialization error: {}", e),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 以環境變數覆寫設定檔內容
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            self.api.client_id = client_id;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.api.access_token = Some(token);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }

        // 未替換的 ${VAR} 視同未設定
        if self.api.client_id.starts_with("${") {
            self.api.client_id.clear();
        }
        if self.api.access_token.as_deref().is_some_and(|t| t.is_empty() || t.starts_with("${")) {
            self.api.access_token = None;
        }

        self
    }
}

fn load_dotenv(dotenv_file: Option<&Path>) {
    let loaded = match dotenv_file {
        Some(path) => dotenv::from_path(path).map(|_| path.to_path_buf()),
        None => dotenv::dotenv(),
    };

    match loaded {
        Ok(path) => tracing::info!("Environment variables loaded from {}", path.display()),
        Err(e) => tracing::debug!("No .env file loaded: {}", e),
    }
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.api.base_url
    }

    fn client_id(&self) -> &str {
        &self.api.client_id
    }

    fn access_token(&self) -> Option<&str> {
        self.api.access_token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.api.timeout_seconds
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_api_base_url("api.base_url", &self.api.base_url)?;

        if self.api.client_id.trim().is_empty() {
            return Err(MalError::MissingConfigError {
                field: format!("api.client_id ({})", ENV_CLIENT_ID),
            });
        }

        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 300)?;
        validation::validate_range("matching.cutoff", self.matching.cutoff, 0.0, 1.0)?;
        validation::validate_range("matching.max_candidates", self.matching.max_candidates, 1, 10)?;
        validation::validate_range("matching.search_limit", self.matching.search_limit, 1, 100)?;

        Ok(())
    }
}
