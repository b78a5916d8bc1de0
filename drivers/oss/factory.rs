//! OSS驱动工厂

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::storage::{ConfigItem, DriverConfig, DriverFactory, StorageAdapter};
use super::config::OssConfig;
use super::driver::{OssDriver, DRIVER_NAME};

/// OSS驱动工厂
pub struct OssDriverFactory;

impl DriverFactory for OssDriverFactory {
    fn driver_type(&self) -> &'static str {
        DRIVER_NAME
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            name: "阿里云OSS".to_string(),
            temporary_urls: true, // 预签名URL
            cdn_refresh: false,
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("access_key", "string")
                .title("AccessKey ID")
                .required(),
            ConfigItem::new("secret_key", "password")
                .title("AccessKey Secret")
                .required(),
            ConfigItem::new("bucket", "string")
                .title("存储桶名称")
                .required(),
            ConfigItem::new("endpoint", "string")
                .title("端点地址")
                .help("如 oss-cn-hangzhou.aliyuncs.com")
                .required(),
            ConfigItem::new("endpoint_internal", "string")
                .title("内网端点")
                .help("ECS内网访问时填写，如 oss-cn-hangzhou-internal.aliyuncs.com"),
            ConfigItem::new("region", "string")
                .title("签名区域")
                .help("留空则取端点第一段"),
            ConfigItem::new("ssl", "bool")
                .title("使用HTTPS")
                .default("false"),
            ConfigItem::new("is_cname", "bool")
                .title("自定义域名")
                .help("端点为绑定到存储桶的自定义域名时开启")
                .default("false"),
            ConfigItem::new("cnd_domain", "string")
                .title("CDN域名")
                .help("公开链接和临时链接使用的加速域名（可选）"),
            ConfigItem::new("force_path_style", "bool")
                .title("强制路径风格")
                .help("MinIO等需要开启此选项")
                .default("false"),
            ConfigItem::new("debug", "bool")
                .title("调试日志")
                .default("false"),
        ]
    }

    fn create_driver(&self, config: Value) -> Result<Box<dyn StorageAdapter>> {
        let config: OssConfig = serde_json::from_value(config)
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;
        Ok(Box::new(OssDriver::new(config)?))
    }
}
