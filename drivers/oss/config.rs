//! OSS驱动配置

use serde::{Deserialize, Serialize};

/// OSS配置
#[derive(Clone, Serialize, Deserialize)]
pub struct OssConfig {
    /// AccessKey ID
    pub access_key: String,
    /// AccessKey Secret
    pub secret_key: String,
    /// 存储桶名称
    pub bucket: String,
    /// 外网端点，如 oss-cn-hangzhou.aliyuncs.com
    pub endpoint: String,
    /// 内网端点（ECS内访问时使用），留空则使用 endpoint
    #[serde(default)]
    pub endpoint_internal: String,
    /// 签名区域，留空则取端点第一段，如 oss-cn-hangzhou
    #[serde(default)]
    pub region: String,
    /// 是否使用HTTPS
    #[serde(default)]
    pub ssl: bool,
    /// endpoint/cnd_domain 是否为绑定到存储桶的自定义域名
    #[serde(default)]
    pub is_cname: bool,
    /// 打印生效配置（密钥已隐藏）
    #[serde(default)]
    pub debug: bool,
    /// CDN加速域名，公开链接和临时链接使用此域名
    #[serde(default, alias = "cdn_domain")]
    pub cnd_domain: String,
    /// 强制使用路径风格（MinIO等兼容服务需要开启）
    #[serde(default)]
    pub force_path_style: bool,
}

impl std::fmt::Debug for OssConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("endpoint_internal", &self.endpoint_internal)
            .field("region", &self.region)
            .field("ssl", &self.ssl)
            .field("is_cname", &self.is_cname)
            .field("debug", &self.debug)
            .field("cnd_domain", &self.cnd_domain)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// 去掉协议和末尾斜杠，只保留主机部分
pub fn strip_scheme(endpoint: &str) -> &str {
    let endpoint = endpoint.trim();
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
        .trim_end_matches('/')
}

impl OssConfig {
    pub fn scheme(&self) -> &'static str {
        if self.ssl { "https://" } else { "http://" }
    }

    /// 补全协议；已带协议的地址原样保留
    pub fn with_scheme(&self, host: &str) -> String {
        let host = host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("{}{}", self.scheme(), host)
        }
    }

    /// 实际发送请求的端点
    pub fn request_endpoint(&self) -> String {
        let host = if self.is_cname && !self.cnd_domain.is_empty() {
            &self.cnd_domain
        } else if !self.endpoint_internal.is_empty() {
            &self.endpoint_internal
        } else {
            &self.endpoint
        };
        self.with_scheme(host)
    }

    pub fn signing_region(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }
        strip_scheme(&self.endpoint)
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// 公开访问的基础地址（不含末尾斜杠）
    pub fn public_base(&self) -> String {
        if !self.cnd_domain.is_empty() {
            return self.with_scheme(&self.cnd_domain);
        }
        let host = strip_scheme(&self.endpoint);
        if self.is_cname {
            format!("{}{}", self.scheme(), host)
        } else {
            format!("{}{}.{}", self.scheme(), self.bucket, host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(extra: serde_json::Value) -> OssConfig {
        let mut base = json!({
            "access_key": "ak",
            "secret_key": "sk",
            "bucket": "media",
            "endpoint": "oss-cn-hangzhou.aliyuncs.com"
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config(json!({}));
        assert!(!config.ssl && !config.is_cname && !config.debug);
        assert!(config.cnd_domain.is_empty() && config.endpoint_internal.is_empty());
        assert_eq!(config.request_endpoint(), "http://oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(config.signing_region(), "oss-cn-hangzhou");
        assert_eq!(config.public_base(), "http://media.oss-cn-hangzhou.aliyuncs.com");
    }

    #[test]
    fn test_request_endpoint_selection() {
        let internal = config(json!({"endpoint_internal": "oss-cn-hangzhou-internal.aliyuncs.com", "ssl": true}));
        assert_eq!(internal.request_endpoint(), "https://oss-cn-hangzhou-internal.aliyuncs.com");
        assert_eq!(internal.public_base(), "https://media.oss-cn-hangzhou.aliyuncs.com");

        let cname = config(json!({
            "endpoint_internal": "oss-cn-hangzhou-internal.aliyuncs.com",
            "is_cname": true,
            "cdn_domain": "img.example.com"
        }));
        assert_eq!(cname.cnd_domain, "img.example.com");
        assert_eq!(cname.request_endpoint(), "http://img.example.com");
    }

    #[test]
    fn test_public_base() {
        let cname = config(json!({"endpoint": "https://files.example.com/", "is_cname": true}));
        assert_eq!(cname.public_base(), "http://files.example.com");
        assert_eq!(cname.signing_region(), "files");

        let cdn = config(json!({"cnd_domain": "https://cdn.example.com/"}));
        assert_eq!(cdn.public_base(), "https://cdn.example.com");

        let region = config(json!({"region": "cn-hangzhou"}));
        assert_eq!(region.signing_region(), "cn-hangzhou");
    }

    #[test]
    fn test_debug_hides_secret() {
        let printed = format!("{:?}", config(json!({})));
        assert!(printed.contains("media"));
        assert!(!printed.contains("\"sk\""));
    }
}
