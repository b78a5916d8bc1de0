//! 七牛资源管理：stat / delete / move / copy / list

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::auth::{QiniuAuth, FORM_MIME};
use super::types::{ErrResp, ListFilesResult, QiniuError, StatInfo};

/// EncodedEntryURI = urlsafe_base64("bucket:key")
pub fn encode_entry(bucket: &str, key: &str) -> String {
    URL_SAFE.encode(format!("{}:{}", bucket, key))
}

/// 解析七牛响应：非2xx 转为 `QiniuError::Api`，空响应体按 null 处理
pub(super) async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, QiniuError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrResp>(&text)
            .ok()
            .map(|e| e.error)
            .filter(|m| !m.is_empty())
            .unwrap_or(text);
        return Err(QiniuError::Api { code: status.as_u16() as u32, message });
    }

    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    Ok(serde_json::from_str(text)?)
}

/// 资源管理客户端
pub struct BucketManager {
    auth: Arc<QiniuAuth>,
    client: Client,
    rs_url: String,
    rsf_url: String,
}

impl BucketManager {
    pub fn new(auth: Arc<QiniuAuth>, client: Client, rs_url: String, rsf_url: String) -> Self {
        Self { auth, client, rs_url, rsf_url }
    }

    pub fn auth(&self) -> &Arc<QiniuAuth> {
        &self.auth
    }

    /// 获取资源元信息
    pub async fn stat(&self, bucket: &str, key: &str) -> Result<StatInfo, QiniuError> {
        let url = format!("{}/stat/{}", self.rs_url, encode_entry(bucket, key));
        self.request(Method::GET, &url).await
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), QiniuError> {
        let url = format!("{}/delete/{}", self.rs_url, encode_entry(bucket, key));
        self.request::<Value>(Method::POST, &url).await.map(|_| ())
    }

    /// 同空间内重命名，不覆盖已存在的目标
    pub async fn rename(&self, bucket: &str, from: &str, to: &str) -> Result<(), QiniuError> {
        self.move_object(bucket, from, bucket, to, false).await
    }

    pub async fn move_object(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
        force: bool,
    ) -> Result<(), QiniuError> {
        let url = format!(
            "{}/move/{}/{}/force/{}",
            self.rs_url,
            encode_entry(from_bucket, from_key),
            encode_entry(to_bucket, to_key),
            force
        );
        self.request::<Value>(Method::POST, &url).await.map(|_| ())
    }

    pub async fn copy(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
        force: bool,
    ) -> Result<(), QiniuError> {
        let url = format!(
            "{}/copy/{}/{}/force/{}",
            self.rs_url,
            encode_entry(from_bucket, from_key),
            encode_entry(to_bucket, to_key),
            force
        );
        self.request::<Value>(Method::POST, &url).await.map(|_| ())
    }

    /// 列举一页资源，`marker` 为空表示从头开始
    pub async fn list_files(
        &self,
        bucket: &str,
        prefix: &str,
        marker: &str,
        limit: u32,
        delimiter: Option<&str>,
    ) -> Result<ListFilesResult, QiniuError> {
        let limit = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![("bucket", bucket), ("limit", limit.as_str())];
        if !prefix.is_empty() {
            params.push(("prefix", prefix));
        }
        if !marker.is_empty() {
            params.push(("marker", marker));
        }
        if let Some(delimiter) = delimiter {
            params.push(("delimiter", delimiter));
        }

        let url = Url::parse_with_params(&format!("{}/list", self.rsf_url), &params)?;
        self.request(Method::POST, url.as_str()).await
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, url: &str) -> Result<T, QiniuError> {
        let authorization = self.auth.authorization(url, None, Some(FORM_MIME))?;
        tracing::debug!("七牛管理请求: {} {}", method, url);

        let resp = self.client
            .request(method, url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, FORM_MIME)
            .send()
            .await?;

        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_entry() {
        assert_eq!(encode_entry("media", "docs/a.txt"), "bWVkaWE6ZG9jcy9hLnR4dA==");
    }
}
