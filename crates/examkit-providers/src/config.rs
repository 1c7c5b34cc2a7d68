//! examkit configuration and collaborator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkit_core::session::{FinalExpiryPolicy, SessionConfig, SessionContext};
use examkit_core::traits::{QuestionSource, RemoteScorer};

use crate::cache::CachingSource;
use crate::client::{ApiClient, DEFAULT_TIMEOUT_SECS};
use crate::questions::HttpQuestionSource;
use crate::scorer::HttpScorer;

/// Connection settings for the exam backend.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// `[session]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Restart a question's full allotment whenever it is entered.
    #[serde(default = "default_true")]
    pub reset_on_revisit: bool,
    /// Submit automatically when the last question's time runs out.
    #[serde(default)]
    pub auto_submit_on_final_expiry: bool,
    /// Length of one timer second in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_tick_ms() -> u64 {
    1000
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reset_on_revisit: true,
            auto_submit_on_final_expiry: false,
            tick_ms: default_tick_ms(),
        }
    }
}

impl SessionSettings {
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            reset_on_revisit: self.reset_on_revisit,
            final_expiry: if self.auto_submit_on_final_expiry {
                FinalExpiryPolicy::AutoSubmit
            } else {
                FinalExpiryPolicy::Wait
            },
            tick_period: Duration::from_millis(self.tick_ms.max(1)),
        }
    }
}

/// Top-level examkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamkitConfig {
    /// Backend used for generated questions and remote scoring.
    #[serde(default)]
    pub api: Option<ApiConfig>,
    /// User id sent with requests.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session: SessionSettings,
    /// Output directory for exam reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./examkit-results")
}

impl Default for ExamkitConfig {
    fn default() -> Self {
        Self {
            api: None,
            user_id: None,
            session: SessionSettings::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl ExamkitConfig {
    /// Who is taking the exam, as far as configuration knows.
    pub fn session_context(&self) -> SessionContext {
        SessionContext {
            user_id: self.user_id.clone(),
            access_token: self.api.as_ref().and_then(|api| api.token.clone()),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are inserted as-is; references inside them are not expanded.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkit.toml` in the current directory
/// 2. `~/.config/examkit/config.toml`
///
/// Environment variable overrides: `EXAMKIT_API_URL`, `EXAMKIT_TOKEN`, `EXAMKIT_USER`.
pub fn load_config() -> Result<ExamkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examkit.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<ExamkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => ExamkitConfig::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    resolve_config(&mut config);

    Ok(config)
}

/// Apply `EXAMKIT_*` overrides from `lookup`.
fn apply_overrides(config: &mut ExamkitConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("EXAMKIT_API_URL") {
        if let Some(api) = config.api.as_mut() {
            api.base_url = url;
        } else {
            config.api = Some(ApiConfig {
                base_url: url,
                token: None,
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            });
        }
    }

    if let Some(token) = lookup("EXAMKIT_TOKEN") {
        if let Some(api) = &mut config.api {
            api.token = Some(token);
        }
    }

    if let Some(user) = lookup("EXAMKIT_USER") {
        config.user_id = Some(user);
    }
}

/// Resolve env vars in string settings.
fn resolve_config(config: &mut ExamkitConfig) {
    if let Some(api) = &mut config.api {
        api.base_url = resolve_env_vars(&api.base_url);
        api.token = api
            .token
            .as_deref()
            .map(resolve_env_vars)
            .filter(|t| !t.is_empty());
    }
    config.user_id = config
        .user_id
        .as_deref()
        .map(resolve_env_vars)
        .filter(|u| !u.is_empty());
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkit"))
}

fn api_client(config: &ApiConfig) -> Result<ApiClient> {
    ApiClient::new(&config.base_url, config.token.clone(), config.timeout_secs)
}

/// Create the HTTP question source. Fetches are cached per request so a
/// retake gets the same generated questions.
pub fn create_question_source(config: &ExamkitConfig) -> Result<Box<dyn QuestionSource>> {
    let api = config
        .api
        .as_ref()
        .context("no [api] section configured; set EXAMKIT_API_URL or use --bank")?;
    let source = HttpQuestionSource::new(api_client(api)?);
    Ok(Box::new(CachingSource::new(source)))
}

/// Create the remote scorer, if a backend is configured.
pub fn create_scorer(config: &ExamkitConfig) -> Result<Option<Arc<dyn RemoteScorer>>> {
    match &config.api {
        Some(api) => {
            let scorer: Arc<dyn RemoteScorer> = Arc::new(HttpScorer::new(api_client(api)?));
            Ok(Some(scorer))
        }
        None => Ok(None),
    }
}
