use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

// A missing `[database]` section must get the same pool settings as an empty one.
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Directory-wide settings consumed by record validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DirectoryConfig {
    /// Accepted city/county names for a service's `service_areas`.
    /// Empty disables the service-area rule.
    #[serde(default)]
    pub valid_service_areas: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the compact human format.
    #[serde(default)]
    pub json: bool,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 加载 .env（若存在），供下面的环境变量回退使用
        let _ = dotenvy::dotenv();
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        // 服务区域白名单：TOML 为空时尝试 VALID_SERVICE_AREAS
        self.directory.normalize_from_env();
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl DirectoryConfig {
    pub fn normalize_from_env(&mut self) {
        if self.valid_service_areas.is_empty() {
            if let Ok(raw) = std::env::var("VALID_SERVICE_AREAS") {
                self.valid_service_areas = parse_area_list(&raw);
            }
        }
        self.drop_blank_areas();
    }

    /// Blank entries can never match a real area; everything else is kept verbatim.
    pub fn drop_blank_areas(&mut self) {
        self.valid_service_areas.retain(|a| !a.trim().is_empty());
    }
}

/// Split a comma separated env value into area names.
pub fn parse_area_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directory_section() {
        let cfg = load_from_str(
            r#"
            [database]
            url = "postgres://localhost/directory"

            [directory]
            valid_service_areas = ["Springfield", "Shelbyville"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.directory.valid_service_areas, vec!["Springfield", "Shelbyville"]);
        assert_eq!(cfg.database.max_connections, 10);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let cfg = load_from_str("").unwrap();
        assert!(cfg.directory.valid_service_areas.is_empty());
        assert!(cfg.database.url.is_empty());
    }

    #[test]
    fn area_list_splits_on_commas() {
        assert_eq!(parse_area_list("Springfield, Shelbyville,,  "), vec!["Springfield", "Shelbyville"]);
        assert!(parse_area_list("").is_empty());
    }

    #[test]
    fn blank_areas_are_dropped_but_others_kept_verbatim() {
        let mut d = DirectoryConfig { valid_service_areas: vec!["San Mateo County".into(), "  ".into(), "belmont".into()] };
        d.drop_blank_areas();
        assert_eq!(d.valid_service_areas, vec!["San Mateo County", "belmont"]);
    }

    #[test]
    fn missing_database_section_uses_pool_defaults() {
        let cfg = load_from_str("[directory]\nvalid_service_areas = [\"Springfield\"]").unwrap();
        assert_eq!(cfg.database.min_connections, 2);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.acquire_timeout_secs, 30);

        let mut db = cfg.database.clone();
        db.url = "postgres://localhost/directory".into();
        assert!(db.validate().is_ok());
    }

    #[test]
    fn database_url_falls_back_to_env_without_database_section() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/directory");
        let mut cfg = load_from_str("").unwrap();
        let res = cfg.normalize_and_validate();
        std::env::remove_var("DATABASE_URL");
        res.unwrap();
        assert_eq!(cfg.database.url, "postgres://localhost/directory");
        assert_eq!((cfg.database.min_connections, cfg.database.max_connections), (2, 10));
    }

    #[test]
    fn database_url_scheme_is_checked() {
        let mut db = DatabaseConfig { url: "mysql://x".into(), min_connections: 1, max_connections: 2, connect_timeout_secs: 1, acquire_timeout_secs: 1, ..Default::default() };
        assert!(db.validate().is_err());
        db.url = "postgres://localhost/directory".into();
        assert!(db.validate().is_ok());
    }
}
