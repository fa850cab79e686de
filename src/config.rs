//! 客户端配置
//!
//! 读取优先级（逐字段）：
//! 1. 配置文件 `~/.config/tutor-chat/config.json`（字段 `api_base_url`、`auth_token`、`timeout_secs`）
//! 2. 环境变量 `TUTOR_API_URL`、`TUTOR_API_TOKEN`、`TUTOR_TIMEOUT_SECS`
//! 3. 默认值
//!
//! 命令行参数 `--api-url` / `--token` 在此之上覆盖。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 默认后端地址
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// 默认请求超时（秒），流式回复可能较慢
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const ENV_API_URL: &str = "TUTOR_API_URL";
const ENV_API_TOKEN: &str = "TUTOR_API_TOKEN";
const ENV_TIMEOUT_SECS: &str = "TUTOR_TIMEOUT_SECS";

/// 后端连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorConfig {
    /// 后端 API 根地址（不含结尾 `/`）
    pub api_base_url: String,
    /// Bearer token
    pub auth_token: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// 配置文件格式，所有字段可省略
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    timeout_secs: Option<u64>,
}

impl TutorConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/tutor-chat/config.json"))
    }

    /// 从默认配置文件、环境变量和默认值自动加载
    ///
    /// 默认配置文件损坏时只记录警告并忽略。
    pub fn auto_load() -> Self {
        let file = Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match read_config_file(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), "Loaded config file");
                    Some(file)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    None
                }
            })
            .unwrap_or_default();

        Self::merge(file)
    }

    /// 从指定配置文件加载（文件必须存在且合法），缺失字段依次取环境变量和默认值
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = read_config_file(path)?;
        Ok(Self::merge(file))
    }

    /// 应用命令行覆盖
    pub fn with_overrides(mut self, api_base_url: Option<String>, auth_token: Option<String>) -> Self {
        if let Some(url) = api_base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = normalize_base_url(&url);
        }
        if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
            self.auth_token = Some(token);
        }
        self
    }

    /// 拼接 API 路径，`path` 以 `/` 开头
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn merge(file: ConfigFile) -> Self {
        let defaults = Self::default();

        let api_base_url = non_empty(file.api_base_url)
            .or_else(|| env_value(ENV_API_URL))
            .map(|u| normalize_base_url(&u))
            .unwrap_or(defaults.api_base_url);

        let auth_token = non_empty(file.auth_token).or_else(|| env_value(ENV_API_TOKEN));

        let timeout_secs = file
            .timeout_secs
            .or_else(|| {
                env_value(ENV_TIMEOUT_SECS).and_then(|v| match v.parse() {
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        warn!(value = %v, "Ignoring invalid {}", ENV_TIMEOUT_SECS);
                        None
                    }
                })
            })
            .unwrap_or(defaults.timeout_secs);

        Self {
            api_base_url,
            auth_token,
            timeout_secs,
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn env_value(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TutorConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.auth_token, None);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url(" http://x/api/ "), "http://x/api");
        assert_eq!(normalize_base_url("http://x/api//"), "http://x/api");
    }

    #[test]
    fn test_overrides() {
        let config = TutorConfig::default().with_overrides(
            Some("https://tutor.example.com/api/".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(config.api_base_url, "https://tutor.example.com/api");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(
            config.endpoint("/chatbot/sessions/"),
            "https://tutor.example.com/api/chatbot/sessions/"
        );
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = TutorConfig::default().with_overrides(Some("  ".to_string()), Some(String::new()));
        assert_eq!(config, TutorConfig::default());
    }
}
