use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

pub const APP_NAME: &str = "icon-mcp";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "ICON_MCP_CONFIG_DIR";

/// Where catalog records come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CatalogSource {
    /// JSON or TOML manifest listing icons explicitly
    Manifest { path: PathBuf },
    /// Local IconifyJSON collection file
    IconifyJson { path: PathBuf },
    /// Remote Iconify collection, listed through the API
    Iconify { prefix: String },
}

impl CatalogSource {
    /// Whether loading this source needs the network
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Iconify { .. })
    }

    /// Resolve a relative file path against `base`
    #[must_use]
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::Manifest { path } if path.is_relative() => Self::Manifest {
                path: base.join(path),
            },
            Self::IconifyJson { path } if path.is_relative() => Self::IconifyJson {
                path: base.join(path),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog sources, loaded in order
    pub sources: Vec<CatalogSource>,
    /// Iconify API hosts, primary first
    pub iconify_hosts: Vec<String>,
    /// User agent sent with every HTTP request
    pub user_agent: String,
    /// Timeout for catalog loading and content fetches
    pub request_timeout_secs: u64,
    /// Number of candidates returned when the caller gives no limit
    pub default_limit: usize,
    /// Upper bound on the number of candidates per search
    pub max_limit: usize,
    /// Directory used by `save` when none is given
    pub default_export_dir: PathBuf,
    /// Replace existing files on export instead of failing
    pub overwrite_existing: bool,
    /// Query term expansions applied before matching
    pub query_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec![
                CatalogSource::Iconify {
                    prefix: String::from("mdi"),
                },
                CatalogSource::Iconify {
                    prefix: String::from("lucide"),
                },
            ],
            iconify_hosts: vec![
                String::from("https://api.iconify.design"),
                String::from("https://api.simplesvg.com"),
                String::from("https://api.unisvg.com"),
            ],
            user_agent: format!("{APP_NAME}/{APP_VERSION}"),
            request_timeout_secs: 30,
            default_limit: 10,
            max_limit: 999,
            default_export_dir: PathBuf::from("icons"),
            overwrite_existing: false,
            query_aliases: default_query_aliases(),
        }
    }
}

fn default_query_aliases() -> BTreeMap<String, Vec<String>> {
    [
        ("付款", &["payment", "pay"][..]),
        ("支付", &["payment", "pay"]),
        ("首页", &["home"]),
        ("主页", &["home"]),
        ("搜索", &["search"]),
        ("设置", &["settings", "cog"]),
        ("用户", &["user", "account"]),
        ("删除", &["delete", "trash"]),
        ("编辑", &["edit", "pencil"]),
        ("下载", &["download"]),
        ("上传", &["upload"]),
        ("购物车", &["cart", "shopping"]),
        ("消息", &["message", "chat"]),
        ("邮件", &["email", "mail"]),
        ("日历", &["calendar"]),
        ("关闭", &["close"]),
        ("菜单", &["menu"]),
    ]
    .into_iter()
    .map(|(term, expansion)| {
        (
            term.to_string(),
            expansion.iter().map(ToString::to_string).collect(),
        )
    })
    .collect()
}

impl Config {
    /// Get the configuration directory path for the current OS
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or_else(|| AppError::Config("Could not determine config directory".into()))
    }

    /// Configured sources, with relative file paths taken from the config directory
    pub fn catalog_sources(&self) -> Result<Vec<CatalogSource>> {
        let dir = Self::config_dir()?;
        Ok(self
            .sources
            .iter()
            .cloned()
            .map(|source| source.relative_to(&dir))
            .collect())
    }

    /// Get the path to the config file
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from file, creating defaults if needed
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config = Self::parse(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(config_path, content)?;
        Ok(())
    }

    /// Reject settings no operation can work with
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(AppError::Config("Limits must be at least 1".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(AppError::Config(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.sources.iter().any(CatalogSource::is_remote) && self.iconify_hosts.is_empty() {
            return Err(AppError::Config(
                "Remote sources configured but iconify_hosts is empty".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.iconify_hosts[0], "https://api.iconify.design");
        assert_eq!(config.query_aliases["付款"], vec!["payment", "pay"]);
    }

    #[test]
    fn test_parse_sources() {
        let config = Config::parse(
            r#"
default_limit = 5

[[sources]]
kind = "manifest"
path = "icons.json"

[[sources]]
kind = "iconify"
prefix = "tabler"
"#,
        )
        .unwrap();

        assert_eq!(config.default_limit, 5);
        assert_eq!(
            config.sources,
            vec![
                CatalogSource::Manifest {
                    path: PathBuf::from("icons.json")
                },
                CatalogSource::Iconify {
                    prefix: "tabler".into()
                },
            ]
        );
        // Unset keys keep their defaults
        assert_eq!(config.max_limit, 999);
    }

    #[test]
    fn test_rejects_bad_limits() {
        assert!(Config::parse("default_limit = 0").is_err());
        assert!(Config::parse("default_limit = 20\nmax_limit = 10").is_err());
    }


    #[test]
    fn test_sources_relative_to_config_dir() {
        let base = Path::new("/etc/icon-mcp");
        assert_eq!(
            CatalogSource::Manifest {
                path: PathBuf::from("icons.toml")
            }
            .relative_to(base),
            CatalogSource::Manifest {
                path: base.join("icons.toml")
            }
        );
        let absolute = CatalogSource::IconifyJson {
            path: PathBuf::from("/srv/mdi.json"),
        };
        assert_eq!(absolute.clone().relative_to(base), absolute);
        let remote = CatalogSource::Iconify {
            prefix: "mdi".into(),
        };
        assert_eq!(remote.clone().relative_to(base), remote);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.sources, config.sources);
        assert_eq!(parsed.query_aliases, config.query_aliases);
    }
}
