//! 七牛CDN刷新与预取

use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use super::auth::{QiniuAuth, JSON_MIME};
use super::bucket::parse_response;
use super::types::{QiniuError, RefreshResult};

pub struct CdnManager {
    auth: Arc<QiniuAuth>,
    client: Client,
    api_url: String,
}

impl CdnManager {
    pub fn new(auth: Arc<QiniuAuth>, client: Client, api_url: String) -> Self {
        Self { auth, client, api_url }
    }

    pub async fn refresh_urls(&self, urls: &[String]) -> Result<RefreshResult, QiniuError> {
        self.refresh_urls_and_dirs(urls, &[]).await
    }

    pub async fn refresh_dirs(&self, dirs: &[String]) -> Result<RefreshResult, QiniuError> {
        self.refresh_urls_and_dirs(&[], dirs).await
    }

    pub async fn refresh_urls_and_dirs(
        &self,
        urls: &[String],
        dirs: &[String],
    ) -> Result<RefreshResult, QiniuError> {
        let url = format!("{}/v2/tune/refresh", self.api_url);
        self.post(&url, json!({ "urls": urls, "dirs": dirs })).await
    }

    pub async fn prefetch_urls(&self, urls: &[String]) -> Result<RefreshResult, QiniuError> {
        let url = format!("{}/v2/tune/prefetch", self.api_url);
        self.post(&url, json!({ "urls": urls })).await
    }

    async fn post(&self, url: &str, body: Value) -> Result<RefreshResult, QiniuError> {
        let body = serde_json::to_vec(&body)?;
        let authorization = self.auth.authorization(url, Some(&body), Some(JSON_MIME))?;

        let resp = self.client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, JSON_MIME)
            .body(body)
            .send()
            .await?;

        let result: RefreshResult = parse_response(resp).await?;
        if result.code != 200 {
            return Err(QiniuError::Api {
                code: result.code.max(0) as u32,
                message: result.error,
            });
        }

        tracing::debug!("七牛CDN请求完成: {} request_id={}", url, result.request_id);
        Ok(result)
    }
}
