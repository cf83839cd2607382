use secrecy::SecretString;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} must be {expected}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_size: usize,
}

/// Gemini API access. The key is the only required setting in the service.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub system_instruction: String,
    pub request_timeout: Duration,
    pub list_page_size: u32,
}

/// Local side-channel cache for raw uploaded bytes
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            app: AppConfig::from_lookup(&lookup)?,
            gemini: GeminiConfig::from_lookup(&lookup)?,
            storage: StorageConfig::from_lookup(&lookup),
            swagger: SwaggerConfig::from_lookup(&lookup),
        })
    }
}

fn parse_or<T, F>(
    lookup: &F,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, expected }),
        None => Ok(default),
    }
}

impl AppConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024; // 50MB

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = parse_or(lookup, "PORT", Self::DEFAULT_PORT, "a valid port number")?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size = parse_or(
            lookup,
            "MAX_UPLOAD_SIZE",
            Self::DEFAULT_MAX_UPLOAD_SIZE,
            "a valid number",
        )?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_upload_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GeminiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_SYSTEM_INSTRUCTION: &'static str = "You are a PDF-based RAG assistant. \
        Answer only from uploaded documents. You have access to metadata. [page x]";
    const DEFAULT_TIMEOUT_SECS: u64 = 120;
    const DEFAULT_LIST_PAGE_SIZE: u32 = 100;

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let base_url = lookup("GEMINI_BASE_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = lookup("GEMINI_MODEL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());

        let system_instruction = lookup("GEMINI_SYSTEM_INSTRUCTION")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_SYSTEM_INSTRUCTION.to_string());

        let timeout_secs = parse_or(
            lookup,
            "GEMINI_TIMEOUT_SECS",
            Self::DEFAULT_TIMEOUT_SECS,
            "a valid number of seconds",
        )?;

        let list_page_size = parse_or(
            lookup,
            "GEMINI_LIST_PAGE_SIZE",
            Self::DEFAULT_LIST_PAGE_SIZE,
            "a valid number",
        )?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            model,
            system_instruction,
            request_timeout: Duration::from_secs(timeout_secs),
            list_page_size,
        })
    }
}

impl StorageConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let uploads_dir = lookup("UPLOADS_DIR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "uploads".to_string());

        Self {
            uploads_dir: PathBuf::from(uploads_dir),
        }
    }
}

impl SwaggerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Only use credentials if they are non-empty
        let username = lookup("SWAGGER_USERNAME").filter(|s| !s.is_empty());
        let password = lookup("SWAGGER_PASSWORD").filter(|s| !s.is_empty());
        let title = lookup("SWAGGER_TITLE").unwrap_or_else(|| "DocQA Gateway API".to_string());
        let version = lookup("SWAGGER_VERSION").unwrap_or_else(|| "0.1.0".to_string());
        let description = lookup("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|| "Document upload and grounded chat over Gemini".to_string());

        Self {
            username,
            password,
            title,
            version,
            description,
        }
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
