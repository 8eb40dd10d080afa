use thiserror::Error;

#[derive(Error, Debug)]
pub enum MalError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("MyAnimeList returned {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    #[error("Invalid progress: {progress}")]
    InvalidProgress { progress: String },

    #[error("No episode number provided for '{status}'")]
    MissingEpisode { status: String },

    #[error("Invalid list entry at line {line_number}: {line}")]
    InvalidListLine { line_number: usize, line: String },

    #[error("No close match found for '{name}'")]
    AnimeNotFound { name: String },

    #[error("Operation not implemented: {operation}")]
    NotImplemented { operation: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Input,
    Tracking,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MalError::ApiError(_) | MalError::HttpStatusError { .. } => ErrorCategory::Network,
            MalError::ConfigError { .. }
            | MalError::MissingConfigError { .. }
            | MalError::InvalidConfigValueError { .. }
            | MalError::ValidationError { .. } => ErrorCategory::Configuration,
            MalError::InvalidStatus { .. }
            | MalError::InvalidProgress { .. }
            | MalError::MissingEpisode { .. }
            | MalError::InvalidListLine { .. } => ErrorCategory::Input,
            MalError::AnimeNotFound { .. } | MalError::NotImplemented { .. } => {
                ErrorCategory::Tracking
            }
            MalError::IoError(_) | MalError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MalError::AnimeNotFound { .. } => ErrorSeverity::Low,
            MalError::ApiError(_) => ErrorSeverity::Medium,
            MalError::HttpStatusError { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            MalError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MalError::ApiError(_) => "Check your network connection and try again",
            MalError::HttpStatusError { status: 401, .. }
            | MalError::HttpStatusError { status: 403, .. } => {
                "Check MAL_CLIENT_ID / MAL_ACCESS_TOKEN, the access token may have expired"
            }
            MalError::HttpStatusError { .. } => "MyAnimeList may be unavailable, try again later",
            MalError::MissingConfigError { .. } => {
                "Set the missing value in the config file, a .env file or the environment"
            }
            MalError::ConfigError { .. }
            | MalError::InvalidConfigValueError { .. }
            | MalError::ValidationError { .. } => "Review the command-line arguments and config file",
            MalError::InvalidStatus { .. } => {
                "Use one of: watching, completed, on_hold, dropped, plan_to_watch"
            }
            MalError::InvalidProgress { .. } | MalError::MissingEpisode { .. } => {
                "Write progress as 'Ep.14' or 'S.2 Ep.14'"
            }
            MalError::InvalidListLine { .. } => "Each line must look like 'Name:  Status - Ep.N'",
            MalError::AnimeNotFound { .. } => "Try the exact title as shown on MyAnimeList",
            MalError::NotImplemented { .. } => "This command is not available yet",
            MalError::IoError(_) => "Check that the file exists and is readable",
            MalError::SerializationError(_) => "Check that the JSON file is a title -> status object",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MalError::ApiError(e) if e.is_timeout() => "MyAnimeList did not answer in time".to_string(),
            MalError::ApiError(_) => "Could not reach MyAnimeList".to_string(),
            MalError::IoError(e) => format!("File error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, MalError>;
