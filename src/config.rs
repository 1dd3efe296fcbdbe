use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUMMARY_MODEL: &str = "google/gemini-2.5-pro-preview";
pub const DEFAULT_RELEVANCE_MODEL: &str = "google/gemini-2.5-pro-preview";

pub(crate) const DEFAULT_CONFIG: &str = r#"# threadlens default configuration
[server]
host = "127.0.0.1"
port = 5000

[forum]
auth_base = "https://www.reddit.com"
api_base = "https://oauth.reddit.com"
sort = "top"
more_expansions = 0

[llm]
api_base = "https://openrouter.ai/api/v1"
summary_model = "google/gemini-2.5-pro-preview"
relevance_model = "google/gemini-2.5-pro-preview"
max_tokens = 1000
temperature = 0.7
summary_words = 100

[analysis]
default_comment_limit = 10
max_comment_limit = 50

[http]
"#;

const LOCAL_CONFIG_FILE: &str = "threadlens.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub forum: ForumConfig,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    pub auth_base: String,
    pub api_base: String,
    pub sort: String,
    /// How many "load more" placeholders to expand per fetch. 0 disables expansion.
    pub more_expansions: usize,
    #[serde(skip_serializing)]
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            auth_base: "https://www.reddit.com".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
            sort: "top".to_string(),
            more_expansions: 0,
            client_id: None,
            client_secret: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub summary_model: String,
    pub relevance_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub summary_words: u32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            relevance_model: DEFAULT_RELEVANCE_MODEL.to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            summary_words: 100,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub default_comment_limit: usize,
    pub max_comment_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_comment_limit: 10,
            max_comment_limit: 50,
        }
    }
}

impl AnalysisConfig {
    /// Applies the default limit when none is given and rejects values outside
    /// `1..=max_comment_limit`.
    pub fn resolve_limit(&self, limit: Option<usize>) -> Result<usize> {
        let limit = limit.unwrap_or(self.default_comment_limit);
        if !(1..=self.max_comment_limit).contains(&limit) {
            anyhow::bail!(
                "Comment limit must be a whole number between 1 and {}.",
                self.max_comment_limit
            );
        }
        Ok(limit)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Resolves the config file, then layers environment secrets on top.
    ///
    /// File lookup order:
    /// 1) `explicit` (the `--config` flag)
    /// 2) `THREADLENS_CONFIG`
    /// 3) `./threadlens.toml`
    /// 4) the built-in defaults
    pub fn load_auto(explicit: Option<&Path>) -> Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let mut config = match Self::resolve_path(explicit) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::load(&path)?
            }
            None => {
                tracing::info!("No config file found, using built-in defaults");
                Self::from_toml_str(DEFAULT_CONFIG)?
            }
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = env::var("THREADLENS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!(
                "THREADLENS_CONFIG points to non-existent file: {}",
                path.display()
            );
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse TOML from {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content)?;
        Ok(cfg)
    }

    /// Applies secrets and base-URL overrides. `lookup` is usually `std::env::var`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("REDDIT_CLIENT_ID") {
            self.forum.client_id = Some(v);
        }
        if let Some(v) = non_empty("REDDIT_CLIENT_SECRET") {
            self.forum.client_secret = Some(v);
        }
        if let Some(v) = non_empty("REDDIT_USER_AGENT") {
            self.forum.user_agent = Some(v);
        }
        if let Some(v) = non_empty("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = non_empty("OPENROUTER_API_BASE") {
            self.llm.api_base = v;
        }
    }

    /// Checks value ranges only. Missing credentials are reported per request.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_comment_limit == 0 {
            anyhow::bail!("analysis.max_comment_limit must be at least 1");
        }
        if self.analysis.default_comment_limit == 0
            || self.analysis.default_comment_limit > self.analysis.max_comment_limit
        {
            anyhow::bail!(
                "analysis.default_comment_limit must be between 1 and {}",
                self.analysis.max_comment_limit
            );
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be within 0.0-2.0");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
