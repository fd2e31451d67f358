use std::env;
use std::path::PathBuf;

pub const DEFAULT_FLICKR_BASE_URL: &str = "https://api.flickr.com/services/rest/";
pub const DEFAULT_PER_PAGE: u32 = 21;

/// Flickr search settings
#[derive(Clone, Debug)]
pub struct FlickrConfig {
    pub api_key: String,
    pub base_url: String,
    pub per_page: u32,
}

impl FlickrConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            api_key: env::var("FLICKR_API_KEY")?,
            base_url: env::var("FLICKR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FLICKR_BASE_URL.to_string()),
            per_page: env::var("FLICKR_PER_PAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_PER_PAGE),
        })
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub documents_dir: PathBuf,
    pub http_timeout_secs: u64,
    pub flickr: FlickrConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://virtual_tourist.db".to_string()),
            documents_dir: env::var("DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("documents")),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            flickr: FlickrConfig::from_env()?,
        })
    }
}
