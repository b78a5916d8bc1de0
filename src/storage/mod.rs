use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use tokio::io::{AsyncRead, AsyncReadExt};

pub mod error;
pub mod expiration;
pub mod filesystem;
pub mod manager;
pub mod url;

pub use error::{MetadataKind, StorageError};
pub use expiration::Expiration;
pub use filesystem::Filesystem;
pub use manager::{DriverFactory, StorageManager};

/// Result of an adapter operation / 适配器操作结果
pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Lazy listing stream / 惰性列表流
pub type ListStream<'a> = BoxStream<'a, Result<FileAttributes>>;

/// Boxed reader returned by `read_stream` / 读取流
pub type ReadStream = Box<dyn AsyncRead + Unpin + Send>;

/// Extra query parameters for generated URLs / 生成URL时附加的查询参数
pub type UrlOptions = BTreeMap<String, String>;

/// Default mime type when none is given / 默认MIME类型
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            options: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }

    pub fn options(mut self, val: &str) -> Self {
        self.options = Some(val.to_string());
        self
    }
}

/// Driver configuration information / 驱动配置信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Display name / 显示名称
    pub name: String,
    /// Driver can hand out signed temporary URLs / 支持临时签名URL
    #[serde(default)]
    pub temporary_urls: bool,
    /// Driver can purge CDN caches / 支持CDN刷新
    #[serde(default)]
    pub cdn_refresh: bool,
}

/// Complete driver information / 驱动完整信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Common configuration items shared by every disk / 通用配置项
    pub common: Vec<ConfigItem>,
    /// Driver-specific configuration items / 驱动特有配置项
    pub additional: Vec<ConfigItem>,
    /// Basic driver configuration / 驱动基本配置
    pub config: DriverConfig,
}

/// Generate common configuration items (shared by all drivers) / 生成通用配置项
pub fn get_common_items(_config: &DriverConfig) -> Vec<ConfigItem> {
    vec![ConfigItem::new("driver", "string")
        .required()
        .help("Registered driver name, e.g. custom-oss / custom-qiniu")]
}

/// Object visibility / 文件可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Per-call write options / 写入选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Content type; `application/octet-stream` when unset / 内容类型
    #[serde(default)]
    pub mime: Option<String>,
    /// Accepted for compatibility, ignored by every adapter / 兼容字段，适配器忽略
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl WriteOptions {
    pub fn with_mime(mime: impl Into<String>) -> Self {
        Self { mime: Some(mime.into()), ..Self::default() }
    }

    pub fn mime_or_default(&self) -> &str {
        self.mime.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MIME)
    }
}

/// File attributes / 文件属性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: Option<u64>,
    pub visibility: Option<Visibility>,
    /// Unix timestamp (seconds) / Unix时间戳（秒）
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_size: None,
            visibility: None,
            last_modified: None,
            mime_type: None,
        }
    }
}

/// Storage adapter interface / 存储适配器接口
///
/// Every backend implements the same capability set. Backends have no real
/// directories, so directory operations fall back to their file counterparts
/// and visibility is unsupported.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Registered driver name / 驱动名称
    fn name(&self) -> &str;

    async fn file_exists(&self, path: &str) -> Result<bool>;

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        self.file_exists(path).await
    }

    async fn write(&self, path: &str, contents: Bytes, options: &WriteOptions) -> Result<()>;

    /// Drain the reader into memory, then `write` / 读完整个流后写入
    async fn write_stream(
        &self,
        path: &str,
        mut contents: ReadStream,
        options: &WriteOptions,
    ) -> Result<()> {
        let mut data = Vec::new();
        contents
            .read_to_end(&mut data)
            .await
            .map_err(|e| StorageError::write(path, e))?;
        self.write(path, Bytes::from(data), options).await
    }

    async fn read(&self, path: &str) -> Result<Bytes>;

    async fn read_stream(&self, path: &str) -> Result<ReadStream>;

    async fn delete(&self, path: &str) -> Result<()>;

    async fn delete_directory(&self, path: &str) -> Result<()> {
        self.delete(path).await
    }

    async fn create_directory(&self, _path: &str, _options: &WriteOptions) -> Result<()> {
        Ok(())
    }

    async fn set_visibility(&self, path: &str, _visibility: Visibility) -> Result<()> {
        Err(StorageError::set_visibility(path))
    }

    async fn visibility(&self, path: &str) -> Result<FileAttributes> {
        Err(StorageError::metadata(path, MetadataKind::Visibility, ""))
    }

    /// Full metadata record / 完整元数据
    async fn metadata(&self, path: &str) -> Result<FileAttributes>;

    async fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        let meta = self
            .metadata(path)
            .await
            .map_err(|e| e.with_metadata_kind(MetadataKind::MimeType))?;
        if meta.mime_type.is_none() {
            return Err(StorageError::metadata(path, MetadataKind::MimeType, ""));
        }
        Ok(meta)
    }

    async fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        let meta = self
            .metadata(path)
            .await
            .map_err(|e| e.with_metadata_kind(MetadataKind::LastModified))?;
        if meta.last_modified.is_none() {
            return Err(StorageError::metadata(path, MetadataKind::LastModified, ""));
        }
        Ok(meta)
    }

    async fn file_size(&self, path: &str) -> Result<FileAttributes> {
        let meta = self
            .metadata(path)
            .await
            .map_err(|e| e.with_metadata_kind(MetadataKind::FileSize))?;
        if meta.file_size.is_none() {
            return Err(StorageError::metadata(path, MetadataKind::FileSize, ""));
        }
        Ok(meta)
    }

    /// List objects under `path`; `deep` also descends into sub-prefixes / 列出对象
    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListStream<'a>;

    async fn move_file(&self, from: &str, to: &str, options: &WriteOptions) -> Result<()>;

    async fn copy_file(&self, from: &str, to: &str, options: &WriteOptions) -> Result<()>;

    /// Public URL / 公开访问URL
    fn url(&self, path: &str) -> Result<String>;

    /// Signed, expiring URL / 带签名的临时URL
    async fn temporary_url(
        &self,
        path: &str,
        expiration: Expiration,
        options: &UrlOptions,
        method: &str,
    ) -> Result<String>;

    fn as_any(&self) -> &dyn Any;
}

/// Directory prefix used for listings: empty or ending in `/` / 列表前缀
pub(crate) fn list_prefix(path: &str) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Only `GET` URLs can be signed / 仅支持GET签名
pub(crate) fn ensure_get(path: &str, method: &str) -> Result<()> {
    if method.eq_ignore_ascii_case("GET") {
        Ok(())
    } else {
        Err(StorageError::temporary_url(path, format!("unsupported method: {}", method)))
    }
}
