use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 数据源模式
///
/// 启动时根据配置选择一次，运行期间不会因请求失败而切换。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    /// 访问真实后端
    #[default]
    Live,
    /// 离线演示模式，使用内存中的模拟数据
    Demo,
}

impl FromStr for DataSourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataSourceMode::Live),
            "demo" | "offline" | "mock" => Ok(DataSourceMode::Demo),
            other => Err(format!("未知的数据源模式: {}", other)),
        }
    }
}

impl fmt::Display for DataSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceMode::Live => write!(f, "live"),
            DataSourceMode::Demo => write!(f, "demo"),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 地址
    pub api_base_url: String,
    /// 数据源模式
    pub data_source: DataSourceMode,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 登录会话持久化文件
    pub session_file: String,
    /// 启动时要展示的考试
    pub exam_id: Option<i64>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行结束后是否退出登录（默认保留会话供下次使用）
    pub logout_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            data_source: DataSourceMode::Live,
            request_timeout_secs: 30,
            session_file: "session.json".to_string(),
            exam_id: None,
            verbose_logging: false,
            logout_on_exit: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 先读配置文件（如果有），再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// 用外部键值覆盖配置项
    ///
    /// `lookup` 返回 `None` 表示该项未设置。
    pub fn with_overrides<F>(self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let exam_id = match lookup("PORTAL_EXAM_ID") {
            Some(value) => Some(parse_var("PORTAL_EXAM_ID", &value, "i64")?),
            None => self.exam_id,
        };

        Ok(Self {
            api_base_url: lookup("PORTAL_API_BASE_URL").unwrap_or(self.api_base_url),
            data_source: match lookup("PORTAL_DATA_SOURCE") {
                Some(value) => parse_var("PORTAL_DATA_SOURCE", &value, "live|demo")?,
                None => self.data_source,
            },
            request_timeout_secs: match lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
                Some(value) => parse_var("PORTAL_REQUEST_TIMEOUT_SECS", &value, "u64")?,
                None => self.request_timeout_secs,
            },
            session_file: lookup("PORTAL_SESSION_FILE").unwrap_or(self.session_file),
            exam_id,
            verbose_logging: match lookup("VERBOSE_LOGGING") {
                Some(value) => parse_var("VERBOSE_LOGGING", &value, "bool")?,
                None => self.verbose_logging,
            },
            logout_on_exit: match lookup("PORTAL_LOGOUT_ON_EXIT") {
                Some(value) => parse_var("PORTAL_LOGOUT_ON_EXIT", &value, "bool")?,
                None => self.logout_on_exit,
            },
        })
    }
}

fn parse_var<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let config = Config::default()
            .with_overrides(lookup_from(&[
                ("PORTAL_DATA_SOURCE", "demo"),
                ("PORTAL_EXAM_ID", "7"),
                ("PORTAL_REQUEST_TIMEOUT_SECS", "5"),
                ("PORTAL_LOGOUT_ON_EXIT", "true"),
            ]))
            .unwrap();

        assert_eq!(config.data_source, DataSourceMode::Demo);
        assert_eq!(config.exam_id, Some(7));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.session_file, "session.json");
        assert!(config.logout_on_exit);
        assert!(!config.verbose_logging);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let err = Config::default()
            .with_overrides(lookup_from(&[("PORTAL_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();

        assert!(err.to_string().contains("PORTAL_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_from_toml_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_base_url = \"https://portal.example.com/api\"\ndata_source = \"demo\""
        )
        .unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();

        assert_eq!(config.api_base_url, "https://portal.example.com/api");
        assert_eq!(config.data_source, DataSourceMode::Demo);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
