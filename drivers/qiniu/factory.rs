//! 七牛驱动工厂

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::storage::{ConfigItem, DriverConfig, DriverFactory, StorageAdapter};
use super::config::QiniuConfig;
use super::driver::{QiniuDriver, DRIVER_NAME};

/// 七牛驱动工厂
pub struct QiniuDriverFactory;

impl DriverFactory for QiniuDriverFactory {
    fn driver_type(&self) -> &'static str {
        DRIVER_NAME
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            name: "七牛云存储".to_string(),
            temporary_urls: true,
            cdn_refresh: true,
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("access_key", "string")
                .title("Access Key")
                .required(),
            ConfigItem::new("secret_key", "password")
                .title("Secret Key")
                .required(),
            ConfigItem::new("bucket", "string")
                .title("存储空间")
                .help("七牛存储空间名称")
                .required(),
            ConfigItem::new("domain", "string")
                .title("访问域名")
                .help("空间绑定的域名，如 cdn.example.com 或 https://cdn.example.com")
                .required(),
            ConfigItem::new("region", "select")
                .title("存储区域")
                .options("z0,cn-east-2,z1,z2,na0,as0")
                .default("z0"),
            ConfigItem::new("use_https", "bool")
                .title("接口使用HTTPS")
                .default("true"),
            ConfigItem::new("up_host", "string")
                .title("上传域名")
                .help("留空则按存储区域选择"),
            ConfigItem::new("rs_host", "string")
                .title("管理域名")
                .help("留空则按存储区域选择"),
            ConfigItem::new("rsf_host", "string")
                .title("列举域名")
                .help("留空则按存储区域选择"),
            ConfigItem::new("api_host", "string")
                .title("CDN接口域名")
                .default("fusion.qiniuapi.com"),
            ConfigItem::new("timeout", "number")
                .title("接口超时（秒）")
                .help("管理接口整体超时；上传下载只限制连接时间")
                .default("30"),
        ]
    }

    fn create_driver(&self, config: Value) -> Result<Box<dyn StorageAdapter>> {
        let config: QiniuConfig = serde_json::from_value(config)
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;
        Ok(Box::new(QiniuDriver::new(config)?))
    }
}
