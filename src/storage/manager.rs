use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{StorageAdapter, Filesystem, DriverConfig, DriverInfo, ConfigItem, get_common_items};
use crate::config::StorageConfig;

/// Driver factory trait / 驱动工厂 trait
pub trait DriverFactory: Send + Sync {
    /// Driver type name (the name disks refer to) / 驱动类型名称
    fn driver_type(&self) -> &'static str;

    /// Create adapter instance / 创建适配器实例
    fn create_driver(&self, config: Value) -> Result<Box<dyn StorageAdapter>>;

    /// Return driver basic config / 返回驱动基本配置
    fn driver_config(&self) -> DriverConfig;

    /// Return driver specific config items / 返回驱动特有配置项
    fn additional_items(&self) -> Vec<ConfigItem>;

    /// Generate complete driver info (auto merge common + additional) / 生成完整的驱动信息
    fn driver_info(&self) -> DriverInfo {
        let config = self.driver_config();
        let common = get_common_items(&config);
        let additional = self.additional_items();
        DriverInfo { common, additional, config }
    }
}

/// Storage manager (driver factories + named disks) / 存储管理器
#[derive(Clone)]
pub struct StorageManager {
    disks: Arc<RwLock<HashMap<String, Filesystem>>>,
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn DriverFactory>>>>>,
    /// Disk error status (name -> error message) / 磁盘错误状态
    disk_errors: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            disks: Arc::new(RwLock::new(HashMap::new())),
            factories: Arc::new(RwLock::new(HashMap::new())),
            disk_errors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) -> Result<()> {
        let driver_type = factory.driver_type().to_string();
        let factory_box = Arc::new(factory);

        let mut factories = self.factories.write().await;
        factories.insert(driver_type.clone(), factory_box);

        tracing::info!("Driver factory registered: {}", driver_type);
        Ok(())
    }

    /// Create a disk: build the adapter and wrap it in the facade / 创建磁盘
    pub async fn create_disk(&self, name: &str, driver_type: &str, config: Value) -> Result<Filesystem> {
        let factories = self.factories.read().await;
        let factory = factories.get(driver_type)
            .ok_or_else(|| anyhow!("Driver type not found: {}", driver_type))?
            .clone();
        drop(factories);

        match factory.create_driver(config) {
            Ok(adapter) => {
                let disk = Filesystem::new(Arc::from(adapter));
                self.disks.write().await.insert(name.to_string(), disk.clone());
                self.disk_errors.write().await.remove(name);
                tracing::info!("Disk created: {} ({})", name, driver_type);
                Ok(disk)
            }
            Err(e) => {
                let error_msg = e.to_string();
                self.disk_errors.write().await.insert(name.to_string(), error_msg.clone());
                tracing::error!("Disk creation failed: {} ({}) - {}", name, driver_type, error_msg);
                Err(e)
            }
        }
    }

    /// Create every disk listed in the config; failures are recorded, not fatal / 按配置创建全部磁盘
    pub async fn load_disks(&self, config: &StorageConfig) -> usize {
        let mut loaded = 0;
        for (name, disk) in &config.disks {
            let options = Value::Object(disk.options.clone());
            if self.create_disk(name, &disk.driver, options).await.is_ok() {
                loaded += 1;
            }
        }
        loaded
    }

    /// Get disk by name / 获取磁盘
    pub async fn disk(&self, name: &str) -> Option<Filesystem> {
        let disks = self.disks.read().await;
        disks.get(name).cloned()
    }

    /// Remove disk / 移除磁盘
    pub async fn remove_disk(&self, name: &str) -> Result<()> {
        let mut disks = self.disks.write().await;
        disks.remove(name)
            .ok_or_else(|| anyhow!("Disk not found: {}", name))?;

        tracing::info!("Disk removed: {}", name);
        Ok(())
    }

    /// Get disk error status / 获取磁盘错误状态
    pub async fn disk_error(&self, name: &str) -> Option<String> {
        let errors = self.disk_errors.read().await;
        errors.get(name).cloned()
    }

    /// List disk names / 列出所有磁盘
    pub async fn list_disks(&self) -> Vec<String> {
        let disks = self.disks.read().await;
        let mut names: Vec<String> = disks.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all available driver types / 列出所有可用的驱动类型
    pub async fn list_driver_types(&self) -> Vec<String> {
        let factories = self.factories.read().await;
        let mut types: Vec<String> = factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Driver info of every registered factory / 所有驱动的信息
    pub async fn driver_infos(&self) -> Vec<(String, DriverInfo)> {
        let factories = self.factories.read().await;
        let mut infos: Vec<(String, DriverInfo)> = factories
            .iter()
            .map(|(k, f)| (k.clone(), f.driver_info()))
            .collect();
        infos.sort_by(|a, b| a.0.cmp(&b.0));
        infos
    }
}
