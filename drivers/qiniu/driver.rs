//! 七牛驱动核心实现
//!
//! 设计原则：
//! - 鉴权、上传、资源管理、CDN 四个客户端按需创建，每个实例只创建一次
//! - 读取走"私有下载链接 + HTTP GET"
//! - 所有接口错误都转换为带路径的 `StorageError`

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::OnceCell;
use reqwest::Client;
use tokio_util::io::StreamReader;

use crate::storage::url::{append_query, public_url};
use crate::storage::{
    ensure_get, list_prefix, Expiration, FileAttributes, ListStream, MetadataKind, ReadStream,
    Result, StorageAdapter, StorageError, UrlOptions, WriteOptions,
};
use super::auth::QiniuAuth;
use super::bucket::BucketManager;
use super::cdn::CdnManager;
use super::config::QiniuConfig;
use super::types::{PutPolicy, QiniuError, RefreshResult};
use super::upload::UploadManager;

pub const DRIVER_NAME: &str = "custom-qiniu";

/// 私有下载链接默认有效期（秒）
const DOWNLOAD_EXPIRES: u64 = 3600;
/// 写入时上传凭证有效期（秒）
const UPLOAD_TOKEN_EXPIRES: u64 = 3600;
/// 单页列举数量
const LIST_LIMIT: u32 = 1000;
/// putTime 单位为100纳秒
const PUT_TIME_UNITS_PER_SECOND: i64 = 10_000_000;

/// 七牛驱动
pub struct QiniuDriver {
    config: QiniuConfig,
    /// 管理/CDN接口，整个请求受 `timeout` 限制
    client: Client,
    /// 上传下载，只限制建立连接的时间
    transfer_client: Client,
    auth_manager: OnceCell<Arc<QiniuAuth>>,
    upload_manager: OnceCell<UploadManager>,
    bucket_manager: OnceCell<BucketManager>,
    cdn_manager: OnceCell<CdnManager>,
}

impl QiniuDriver {
    /// 创建新的七牛驱动实例
    pub fn new(config: QiniuConfig) -> AnyResult<Self> {
        for (name, value) in [
            ("access_key", &config.access_key),
            ("secret_key", &config.secret_key),
            ("bucket", &config.bucket),
            ("domain", &config.domain),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("七牛配置缺少 {}", name));
            }
        }

        let timeout = Duration::from_secs(config.timeout.max(1));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("创建HTTP客户端失败: {}", e))?;
        let transfer_client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| anyhow!("创建HTTP客户端失败: {}", e))?;

        Ok(Self {
            config,
            client,
            transfer_client,
            auth_manager: OnceCell::new(),
            upload_manager: OnceCell::new(),
            bucket_manager: OnceCell::new(),
            cdn_manager: OnceCell::new(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn auth_manager(&self) -> &Arc<QiniuAuth> {
        self.auth_manager.get_or_init(|| {
            Arc::new(QiniuAuth::new(&self.config.access_key, &self.config.secret_key))
        })
    }

    pub fn bucket_manager(&self) -> &BucketManager {
        self.bucket_manager.get_or_init(|| {
            BucketManager::new(
                self.auth_manager().clone(),
                self.client.clone(),
                self.config.rs_url(),
                self.config.rsf_url(),
            )
        })
    }

    pub fn cdn_manager(&self) -> &CdnManager {
        self.cdn_manager.get_or_init(|| {
            CdnManager::new(self.auth_manager().clone(), self.client.clone(), self.config.api_url())
        })
    }

    pub fn upload_manager(&self) -> &UploadManager {
        self.upload_manager
            .get_or_init(|| UploadManager::new(self.transfer_client.clone(), self.config.up_url()))
    }

    /// 私有下载链接，`expires` 秒后失效
    pub fn private_download_url(&self, path: &str, expires: u64) -> std::result::Result<String, QiniuError> {
        self.auth_manager()
            .private_download_url(&public_url(&self.config.domain, path), expires)
    }

    /// 客户端直传用的上传凭证
    pub fn upload_token(
        &self,
        key: Option<&str>,
        expires: u64,
        policy: Option<&PutPolicy>,
        strict: bool,
    ) -> std::result::Result<String, QiniuError> {
        self.auth_manager()
            .upload_token(&self.config.bucket, key, expires, policy, strict)
    }

    /// 校验上传回调
    pub fn verify_callback(
        &self,
        content_type: Option<&str>,
        origin_authorization: Option<&str>,
        url: Option<&str>,
        body: Option<&[u8]>,
    ) -> bool {
        self.auth_manager()
            .verify_callback(content_type, origin_authorization, url, body)
    }

    /// 刷新这些路径在CDN上的缓存
    pub async fn refresh_cdn(&self, paths: &[&str]) -> std::result::Result<RefreshResult, QiniuError> {
        let urls: Vec<String> = paths
            .iter()
            .map(|p| public_url(&self.config.domain, p))
            .collect();
        self.cdn_manager().refresh_urls(&urls).await
    }

    /// 以 `now` 为基准生成签名链接
    fn signed_url(
        &self,
        path: &str,
        expiration: &Expiration,
        options: &UrlOptions,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let deadline = expiration
            .deadline(now)
            .map_err(|e| StorageError::temporary_url(path, e))?;
        let base = append_query(&public_url(&self.config.domain, path), options);
        Ok(self
            .auth_manager()
            .private_download_url_with_deadline(&base, deadline.timestamp()))
    }

    async fn fetch(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.private_download_url(path, DOWNLOAD_EXPIRES)
            .map_err(|e| StorageError::read(path, e))?;
        tracing::debug!("七牛读取: path={}", path);

        let resp = self.transfer_client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::read(path, e))?;

        if !resp.status().is_success() {
            return Err(StorageError::read(path, format!("HTTP {}", resp.status())));
        }
        Ok(resp)
    }
}

fn normalize_file_info(
    key: &str,
    fsize: Option<u64>,
    put_time: Option<i64>,
    mime_type: Option<String>,
) -> FileAttributes {
    FileAttributes {
        file_size: fsize,
        last_modified: put_time.map(|t| t.div_euclid(PUT_TIME_UNITS_PER_SECOND)),
        mime_type,
        ..FileAttributes::new(key)
    }
}

#[async_trait]
impl StorageAdapter for QiniuDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.bucket_manager().stat(&self.config.bucket, path).await.is_ok())
    }

    async fn write(&self, path: &str, contents: Bytes, options: &WriteOptions) -> Result<()> {
        let token = self
            .auth_manager()
            .upload_token(&self.config.bucket, Some(path), UPLOAD_TOKEN_EXPIRES, None, true)
            .map_err(|e| StorageError::write(path, e))?;

        self.upload_manager()
            .put(&token, Some(path), contents, None, options.mime_or_default(), path)
            .await
            .map_err(|e| StorageError::write(path, e.message()))?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let resp = self.fetch(path).await?;
        resp.bytes().await.map_err(|e| StorageError::read(path, e))
    }

    async fn read_stream(&self, path: &str) -> Result<ReadStream> {
        let resp = self.fetch(path).await?;
        let stream = resp
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.bucket_manager()
            .delete(&self.config.bucket, path)
            .await
            .map_err(|e| StorageError::delete(path, e.message()))
    }

    async fn metadata(&self, path: &str) -> Result<FileAttributes> {
        let stat = self.bucket_manager()
            .stat(&self.config.bucket, path)
            .await
            .map_err(|e| StorageError::metadata(path, MetadataKind::Metadata, e.message()))?;
        Ok(normalize_file_info(path, stat.fsize, stat.put_time, stat.mime_type))
    }

    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListStream<'a> {
        let prefix = list_prefix(path);
        let delimiter = if deep { None } else { Some("/") };

        // 状态为下一页的 marker，None 表示已经取完
        stream::try_unfold(Some(String::new()), move |marker| {
            let prefix = prefix.clone();
            async move {
                let Some(marker) = marker else {
                    return Ok(None);
                };
                let page = self.bucket_manager()
                    .list_files(&self.config.bucket, &prefix, &marker, LIST_LIMIT, delimiter)
                    .await
                    .map_err(|e| StorageError::list(&prefix, e.message()))?;

                let next = page.marker.filter(|m| !m.is_empty());
                let items: Vec<Result<FileAttributes>> = page
                    .items
                    .into_iter()
                    .map(|item| Ok(normalize_file_info(&item.key, item.fsize, item.put_time, item.mime_type)))
                    .collect();
                Ok::<_, StorageError>(Some((stream::iter(items), next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn move_file(&self, from: &str, to: &str, _options: &WriteOptions) -> Result<()> {
        self.bucket_manager()
            .rename(&self.config.bucket, from, to)
            .await
            .map_err(|e| StorageError::move_file(from, to, e.message()))
    }

    async fn copy_file(&self, from: &str, to: &str, _options: &WriteOptions) -> Result<()> {
        self.bucket_manager()
            .copy(&self.config.bucket, from, &self.config.bucket, to, false)
            .await
            .map_err(|e| StorageError::copy_file(from, to, e.message()))
    }

    fn url(&self, path: &str) -> Result<String> {
        Ok(public_url(&self.config.domain, path))
    }

    async fn temporary_url(
        &self,
        path: &str,
        expiration: Expiration,
        options: &UrlOptions,
        method: &str,
    ) -> Result<String> {
        ensure_get(path, method)?;
        self.signed_url(path, &expiration, options, Utc::now())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
