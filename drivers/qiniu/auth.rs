//! 七牛鉴权：HMAC-SHA1 签名、上传凭证、私有下载链接、回调校验

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use url::Url;

use super::types::{PutPolicy, QiniuError};

type HmacSha1 = Hmac<Sha1>;

pub const FORM_MIME: &str = "application/x-www-form-urlencoded";
pub const JSON_MIME: &str = "application/json";

/// 七牛鉴权对象，由 AK/SK 构造
#[derive(Debug, Clone)]
pub struct QiniuAuth {
    access_key: String,
    secret_key: String,
}

impl QiniuAuth {
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// `AK:urlsafe_base64(hmac_sha1(SK, data))`
    pub fn sign(&self, data: &[u8]) -> String {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(data);
        format!("{}:{}", self.access_key, URL_SAFE.encode(mac.finalize().into_bytes()))
    }

    /// 对 base64 后的数据签名，并把数据本身附在末尾
    pub fn sign_with_data(&self, data: &[u8]) -> String {
        let encoded = URL_SAFE.encode(data);
        format!("{}:{}", self.sign(encoded.as_bytes()), encoded)
    }

    /// 管理请求签名：path[?query]\n[body]，只有表单请求才把body纳入签名
    pub fn sign_request(
        &self,
        url: &str,
        body: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<String, QiniuError> {
        let parsed = Url::parse(url)?;
        let mut data = parsed.path().as_bytes().to_vec();
        if let Some(query) = parsed.query() {
            data.push(b'?');
            data.extend_from_slice(query.as_bytes());
        }
        data.push(b'\n');
        if let Some(body) = body {
            if content_type == Some(FORM_MIME) {
                data.extend_from_slice(body);
            }
        }
        Ok(self.sign(&data))
    }

    /// `Authorization` 头的值
    pub fn authorization(
        &self,
        url: &str,
        body: Option<&[u8]>,
        content_type: Option<&str>,
    ) -> Result<String, QiniuError> {
        Ok(format!("QBox {}", self.sign_request(url, body, content_type)?))
    }

    /// 校验七牛回调请求的 Authorization 头
    pub fn verify_callback(
        &self,
        content_type: Option<&str>,
        origin_authorization: Option<&str>,
        url: Option<&str>,
        body: Option<&[u8]>,
    ) -> bool {
        let (Some(origin), Some(url)) = (origin_authorization, url) else {
            return false;
        };
        match self.authorization(url, body, content_type) {
            Ok(expected) => expected == origin,
            Err(e) => {
                tracing::debug!("七牛回调校验失败: url={}, error={}", url, e);
                false
            }
        }
    }

    /// 生成上传凭证，`expires` 秒后失效
    pub fn upload_token(
        &self,
        bucket: &str,
        key: Option<&str>,
        expires: u64,
        policy: Option<&PutPolicy>,
        strict: bool,
    ) -> Result<String, QiniuError> {
        let deadline = deadline_after(expires)?;
        self.upload_token_with_deadline(bucket, key, deadline, policy, strict)
    }

    pub fn upload_token_with_deadline(
        &self,
        bucket: &str,
        key: Option<&str>,
        deadline: i64,
        policy: Option<&PutPolicy>,
        strict: bool,
    ) -> Result<String, QiniuError> {
        let mut args = match policy {
            Some(policy) if strict => {
                let standard = PutPolicy { extra: Default::default(), ..policy.clone() };
                serde_json::to_value(standard)?
            }
            Some(policy) => serde_json::to_value(policy)?,
            None => Value::Object(Default::default()),
        };

        let scope = match key {
            Some(key) => format!("{}:{}", bucket, key),
            None => bucket.to_string(),
        };
        if let Value::Object(map) = &mut args {
            map.insert("scope".to_string(), Value::from(scope));
            map.insert("deadline".to_string(), Value::from(deadline));
        }

        let data = serde_json::to_vec(&args)?;
        Ok(self.sign_with_data(&data))
    }

    /// 私有空间下载链接，`expires` 秒后失效
    pub fn private_download_url(&self, base_url: &str, expires: u64) -> Result<String, QiniuError> {
        let deadline = deadline_after(expires)?;
        Ok(self.private_download_url_with_deadline(base_url, deadline))
    }

    pub fn private_download_url_with_deadline(&self, base_url: &str, deadline: i64) -> String {
        let mut url = base_url.to_string();
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&format!("e={}", deadline));
        let token = self.sign(url.as_bytes());
        format!("{}&token={}", url, token)
    }
}

/// 当前时间 + `expires` 秒，溢出时报错
fn deadline_after(expires: u64) -> Result<i64, QiniuError> {
    i64::try_from(expires)
        .ok()
        .and_then(|secs| chrono::Utc::now().timestamp().checked_add(secs))
        .ok_or(QiniuError::InvalidExpires(expires))
}
