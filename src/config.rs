//! Application configuration module / 应用配置模块
//!
//! Disks are loaded from config.json (or the file named by `STORAGE_CONFIG`).
//! A default config file is created on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config path / 配置文件路径环境变量
pub const CONFIG_ENV: &str = "STORAGE_CONFIG";

/// Storage configuration / 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Disk used when none is named / 默认磁盘
    #[serde(default = "default_disk")]
    pub default: String,
    /// Named disks / 磁盘列表
    #[serde(default)]
    pub disks: BTreeMap<String, DiskConfig>,
}

/// One disk: a driver name plus its driver-specific options / 单个磁盘配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    pub driver: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn default_disk() -> String {
    "qiniu".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default: default_disk(),
            disks: BTreeMap::new(),
        }
    }
}

impl StorageConfig {
    /// Config of the named disk, or the default disk / 获取磁盘配置
    pub fn disk(&self, name: Option<&str>) -> Option<(&str, &DiskConfig)> {
        let name = name.unwrap_or(&self.default);
        self.disks.get_key_value(name).map(|(k, v)| (k.as_str(), v))
    }
}

/// Get the config file path / 获取配置文件路径
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<StorageConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: StorageConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = StorageConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &StorageConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = load_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.default, "qiniu");
        assert!(config.disks.is_empty());
    }

    #[test]
    fn test_disk_options_flattened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "default": "media",
                "disks": {
                    "media": {
                        "driver": "custom-qiniu",
                        "access_key": "ak",
                        "secret_key": "sk",
                        "bucket": "media",
                        "domain": "cdn.example.com"
                    }
                }
            }"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let (name, disk) = config.disk(None).unwrap();
        assert_eq!(name, "media");
        assert_eq!(disk.driver, "custom-qiniu");
        assert_eq!(disk.options["bucket"], "media");
        assert!(!disk.options.contains_key("driver"));
        assert!(config.disk(Some("other")).is_none());

        save_config(&path, &config).unwrap();
        let again = load_config(&path).unwrap();
        assert_eq!(again.disks["media"].options, disk.options);
    }

    #[test]
    fn test_invalid_json_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).unwrap_err().contains("Failed to parse"));
    }
}
