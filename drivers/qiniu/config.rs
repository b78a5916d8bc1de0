//! 七牛驱动配置

use serde::{Deserialize, Serialize};

/// 存储区域，决定默认的上传/管理/列举域名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QiniuRegion {
    /// 华东-浙江
    #[default]
    #[serde(rename = "z0")]
    Z0,
    /// 华东-浙江2
    #[serde(rename = "cn-east-2")]
    CnEast2,
    /// 华北-河北
    #[serde(rename = "z1")]
    Z1,
    /// 华南-广东
    #[serde(rename = "z2")]
    Z2,
    /// 北美-洛杉矶
    #[serde(rename = "na0")]
    Na0,
    /// 亚太-新加坡
    #[serde(rename = "as0")]
    As0,
}

impl QiniuRegion {
    fn id(&self) -> &'static str {
        match self {
            QiniuRegion::Z0 => "z0",
            QiniuRegion::CnEast2 => "cn-east-2",
            QiniuRegion::Z1 => "z1",
            QiniuRegion::Z2 => "z2",
            QiniuRegion::Na0 => "na0",
            QiniuRegion::As0 => "as0",
        }
    }

    pub fn up_host(&self) -> String {
        match self {
            QiniuRegion::Z0 => "upload.qiniup.com".to_string(),
            other => format!("upload-{}.qiniup.com", other.id()),
        }
    }

    pub fn rs_host(&self) -> String {
        format!("rs-{}.qiniuapi.com", self.id())
    }

    pub fn rsf_host(&self) -> String {
        format!("rsf-{}.qiniuapi.com", self.id())
    }
}

pub const FUSION_HOST: &str = "fusion.qiniuapi.com";

/// 七牛配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiniuConfig {
    /// Access Key
    pub access_key: String,
    /// Secret Key
    pub secret_key: String,
    /// 存储空间名称
    pub bucket: String,
    /// 绑定的访问域名（可带 http:// 或 https://）
    pub domain: String,
    /// 存储区域
    #[serde(default)]
    pub region: QiniuRegion,
    /// 访问七牛接口是否使用HTTPS
    #[serde(default = "default_use_https")]
    pub use_https: bool,
    /// 自定义上传域名
    #[serde(default)]
    pub up_host: String,
    /// 自定义管理域名
    #[serde(default)]
    pub rs_host: String,
    /// 自定义列举域名
    #[serde(default)]
    pub rsf_host: String,
    /// 自定义CDN接口域名
    #[serde(default)]
    pub api_host: String,
    /// 管理接口请求超时（秒），上传下载只用作连接超时
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_use_https() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl QiniuConfig {
    fn with_scheme(&self, host: &str) -> String {
        let host = host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else if self.use_https {
            format!("https://{}", host)
        } else {
            format!("http://{}", host)
        }
    }

    fn pick(&self, custom: &str, fallback: String) -> String {
        if custom.is_empty() {
            self.with_scheme(&fallback)
        } else {
            self.with_scheme(custom)
        }
    }

    pub fn up_url(&self) -> String {
        self.pick(&self.up_host, self.region.up_host())
    }

    pub fn rs_url(&self) -> String {
        self.pick(&self.rs_host, self.region.rs_host())
    }

    pub fn rsf_url(&self) -> String {
        self.pick(&self.rsf_host, self.region.rsf_host())
    }

    pub fn api_url(&self) -> String {
        self.pick(&self.api_host, FUSION_HOST.to_string())
    }
}
