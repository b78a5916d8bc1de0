//! OSS驱动核心实现
//!
//! 设计原则：
//! - 所有操作直接映射到 S3 兼容接口（head/put/get/delete/copy/list）
//! - 读取整块缓存在内存中
//! - 配置了CDN域名时，公开链接和预签名链接都换成CDN域名

use std::any::Any;
use std::collections::HashMap;

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::Region;
use url::{Position, Url};

use crate::storage::url::public_url;
use crate::storage::{
    ensure_get, list_prefix, Expiration, FileAttributes, ListStream, MetadataKind, ReadStream,
    Result, StorageAdapter, StorageError, UrlOptions, WriteOptions,
};
use super::config::OssConfig;

pub const DRIVER_NAME: &str = "custom-oss";

/// S3 预签名链接最长有效期（7天）
const MAX_PRESIGN_SECONDS: u64 = 7 * 24 * 3600;

fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

/// OSS驱动
pub struct OssDriver {
    config: OssConfig,
    bucket: Box<Bucket>,
}

impl OssDriver {
    /// 创建新的OSS驱动实例
    pub fn new(config: OssConfig) -> AnyResult<Self> {
        for (name, value) in [
            ("access_key", &config.access_key),
            ("secret_key", &config.secret_key),
            ("bucket", &config.bucket),
            ("endpoint", &config.endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("OSS配置缺少 {}", name));
            }
        }

        if config.debug {
            tracing::debug!("OSS生效配置: {:?}, request_endpoint={}", config, config.request_endpoint());
        }

        let bucket = Self::create_bucket(&config)?;
        Ok(Self { config, bucket })
    }

    /// 创建S3兼容的Bucket客户端
    fn create_bucket(config: &OssConfig) -> AnyResult<Box<Bucket>> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        ).map_err(|e| anyhow!("创建OSS凭证失败: {}", e))?;

        let region = Region::Custom {
            region: config.signing_region(),
            endpoint: config.request_endpoint(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| anyhow!("创建OSS Bucket失败: {}", e))?;

        // 自定义域名已指向存储桶，不能再拼虚拟主机前缀
        let bucket = if config.force_path_style || config.is_cname {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(bucket)
    }

    pub fn config(&self) -> &OssConfig {
        &self.config
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// 对象键：请求路径自带前导斜杠，这里去掉
    fn object_key<'p>(&self, path: &'p str) -> &'p str {
        path.trim_start_matches('/')
    }

    /// 把预签名链接的协议和主机换成CDN域名
    fn with_cdn_host(&self, signed: &str) -> std::result::Result<String, String> {
        if self.config.cnd_domain.is_empty() {
            return Ok(signed.to_string());
        }
        let signed = Url::parse(signed).map_err(|e| e.to_string())?;
        Ok(format!(
            "{}{}",
            self.config.with_scheme(&self.config.cnd_domain),
            &signed[Position::BeforePath..]
        ))
    }

    async fn head(&self, key: &str) -> std::result::Result<(s3::serde_types::HeadObjectResult, u16), String> {
        tracing::debug!("OSS HeadObject: key={}", key);
        self.bucket
            .head_object(key)
            .await
            .map_err(|e| e.to_string())
    }
}

fn parse_http_date(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
}

#[async_trait]
impl StorageAdapter for OssDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn file_exists(&self, path: &str) -> Result<bool> {
        let key = self.object_key(path);
        // 与七牛一致：HEAD 出错一律视为不存在
        match self.head(key).await {
            Ok((_, code)) if is_success(code) => Ok(true),
            Ok((_, code)) => {
                tracing::debug!("OSS HeadObject 失败: key={}, HTTP {}", key, code);
                Ok(false)
            }
            Err(e) => {
                tracing::debug!("OSS HeadObject 失败: key={}, {}", key, e);
                Ok(false)
            }
        }
    }

    async fn write(&self, path: &str, contents: Bytes, options: &WriteOptions) -> Result<()> {
        let key = self.object_key(path);
        let mime = options.mime_or_default();
        tracing::debug!("OSS PutObject: key={}, size={}, mime={}", key, contents.len(), mime);

        let resp = self.bucket
            .put_object_with_content_type(key, &contents, mime)
            .await
            .map_err(|e| StorageError::write(path, e))?;

        if !is_success(resp.status_code()) {
            return Err(StorageError::write(
                path,
                format!("HTTP {}: {}", resp.status_code(), String::from_utf8_lossy(resp.bytes())),
            ));
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let key = self.object_key(path);
        tracing::debug!("OSS GetObject: key={}", key);

        let resp = self.bucket
            .get_object(key)
            .await
            .map_err(|e| StorageError::read(path, e))?;

        if !is_success(resp.status_code()) {
            return Err(StorageError::read(path, format!("HTTP {}", resp.status_code())));
        }
        Ok(resp.bytes().clone())
    }

    async fn read_stream(&self, path: &str) -> Result<ReadStream> {
        // 客户端返回完整响应，封装为AsyncRead
        let data = self.read(path).await?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let key = self.object_key(path);

        // DeleteObject 对不存在的键也返回成功，先确认对象存在
        match self.head(key).await {
            Ok((_, code)) if is_success(code) => {}
            Ok((_, code)) => return Err(StorageError::delete(path, format!("HTTP {}", code))),
            Err(e) => return Err(StorageError::delete(path, e)),
        }

        tracing::debug!("OSS DeleteObject: key={}", key);
        let resp = self.bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::delete(path, e))?;

        if !is_success(resp.status_code()) {
            return Err(StorageError::delete(path, format!("HTTP {}", resp.status_code())));
        }
        Ok(())
    }

    async fn metadata(&self, path: &str) -> Result<FileAttributes> {
        let key = self.object_key(path);
        let (head, code) = self.head(key)
            .await
            .map_err(|e| StorageError::metadata(path, MetadataKind::Metadata, e))?;

        if !is_success(code) {
            return Err(StorageError::metadata(path, MetadataKind::Metadata, format!("HTTP {}", code)));
        }

        Ok(FileAttributes {
            file_size: head.content_length.map(|len| len.max(0) as u64),
            last_modified: head.last_modified.as_deref().and_then(parse_http_date),
            mime_type: head.content_type,
            ..FileAttributes::new(key)
        })
    }

    fn list_contents<'a>(&'a self, path: &str, deep: bool) -> ListStream<'a> {
        let prefix = list_prefix(self.object_key(path));
        let delimiter = if deep { None } else { Some("/".to_string()) };

        let fetch = async move {
            tracing::debug!("OSS ListObjects: prefix={}, deep={}", prefix, deep);
            let pages = self.bucket
                .list(prefix.clone(), delimiter)
                .await
                .map_err(|e| StorageError::list(&prefix, e))?;

            let items: Vec<Result<FileAttributes>> = pages
                .into_iter()
                .flat_map(|page| page.contents)
                // 跳过目录占位对象
                .filter(|obj| !obj.key.ends_with('/'))
                .map(|obj| {
                    Ok(FileAttributes {
                        file_size: Some(obj.size),
                        last_modified: parse_http_date(&obj.last_modified),
                        ..FileAttributes::new(obj.key)
                    })
                })
                .collect();
            Ok::<_, StorageError>(stream::iter(items))
        };

        stream::once(fetch).try_flatten().boxed()
    }

    async fn move_file(&self, from: &str, to: &str, options: &WriteOptions) -> Result<()> {
        self.copy_file(from, to, options)
            .await
            .map_err(|e| StorageError::move_file(from, to, e))?;

        let key = self.object_key(from);
        let resp = self.bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::move_file(from, to, e))?;

        if !is_success(resp.status_code()) {
            return Err(StorageError::move_file(from, to, format!("HTTP {}", resp.status_code())));
        }
        Ok(())
    }

    async fn copy_file(&self, from: &str, to: &str, _options: &WriteOptions) -> Result<()> {
        let src = self.object_key(from);
        let dst = self.object_key(to);
        // 源路径中的中文等非ASCII字符需要URL编码
        let encoded_src = urlencoding::encode(src);
        tracing::debug!("OSS CopyObject: src={}, dst={}", encoded_src, dst);

        let code = self.bucket
            .copy_object_internal(&encoded_src, dst)
            .await
            .map_err(|e| StorageError::copy_file(from, to, e))?;

        if !is_success(code) {
            return Err(StorageError::copy_file(from, to, format!("HTTP {}", code)));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> Result<String> {
        Ok(public_url(&self.config.public_base(), self.object_key(path)))
    }

    async fn temporary_url(
        &self,
        path: &str,
        expiration: Expiration,
        options: &UrlOptions,
        method: &str,
    ) -> Result<String> {
        ensure_get(path, method)?;

        let seconds = expiration
            .seconds_from(Utc::now())
            .map_err(|e| StorageError::temporary_url(path, e))?;
        if seconds > MAX_PRESIGN_SECONDS {
            return Err(StorageError::temporary_url(
                path,
                format!("expiration exceeds {} seconds", MAX_PRESIGN_SECONDS),
            ));
        }

        let queries: Option<HashMap<String, String>> = if options.is_empty() {
            None
        } else {
            Some(options.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        };

        let signed = self.bucket
            .presign_get(self.object_key(path), seconds as u32, queries)
            .await
            .map_err(|e| StorageError::temporary_url(path, e))?;

        self.with_cdn_host(&signed)
            .map_err(|e| StorageError::temporary_url(path, e))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::AsyncReadExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const COPY_RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CopyObjectResult>
  <LastModified>2015-01-01T00:00:00.000Z</LastModified>
  <ETag>"5d41402abc4b2a76b9719d911017c592"</ETag>
</CopyObjectResult>"#;

    fn copy_source_is(expected: &'static str) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
        move |req: &Request| {
            req.headers
                .get("x-amz-copy-source")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start_matches('/') == expected)
                .unwrap_or(false)
        }
    }

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

    fn driver_for(server: &MockServer) -> OssDriver {
        OssDriver::new(config(json!({
            "endpoint": server.uri(),
            "region": "us-east-1",
            "force_path_style": true
        })))
        .unwrap()
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        assert!(OssDriver::new(config(json!({"endpoint": ""}))).is_err());
    }

    #[test]
    fn test_url() {
        let driver = OssDriver::new(config(json!({}))).unwrap();
        assert_eq!(
            driver.url("/a b/c.txt").unwrap(),
            "http://media.oss-cn-hangzhou.aliyuncs.com/a%20b/c.txt"
        );

        let driver = OssDriver::new(config(json!({"ssl": true, "cnd_domain": "cdn.example.com"}))).unwrap();
        assert_eq!(driver.url("docs/a.txt").unwrap(), "https://cdn.example.com/docs/a.txt");
    }

    #[test]
    fn test_cdn_host_substitution() {
        let driver = OssDriver::new(config(json!({"cnd_domain": "https://cdn.example.com"}))).unwrap();
        assert_eq!(
            driver
                .with_cdn_host("http://media.oss-cn-hangzhou.aliyuncs.com/a.txt?X-Amz-Expires=60&X-Amz-Signature=abc")
                .unwrap(),
            "https://cdn.example.com/a.txt?X-Amz-Expires=60&X-Amz-Signature=abc"
        );

        let plain = OssDriver::new(config(json!({}))).unwrap();
        assert_eq!(plain.with_cdn_host("http://h/a.txt?x=1").unwrap(), "http://h/a.txt?x=1");
    }

    #[test]
    fn test_parse_http_date() {
        assert_eq!(parse_http_date("Thu, 01 Jan 2015 00:00:00 GMT"), Some(1420070400));
        assert_eq!(parse_http_date("2015-01-01T00:00:00.000Z"), Some(1420070400));
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[tokio::test]
    async fn test_temporary_url() {
        let driver = OssDriver::new(config(json!({"cnd_domain": "cdn.example.com"}))).unwrap();
        let mut options = UrlOptions::new();
        options.insert("response-content-disposition".to_string(), "attachment".to_string());

        let url = driver
            .temporary_url("/docs/a.txt", Expiration::Seconds(600), &options, "GET")
            .await
            .unwrap();
        assert!(url.starts_with("http://cdn.example.com/docs/a.txt?"), "{}", url);
        assert!(url.contains("X-Amz-Expires=600"));
        assert!(url.contains("response-content-disposition=attachment"));

        assert!(driver
            .temporary_url("a.txt", Expiration::Seconds(600), &options, "POST")
            .await
            .is_err());
        assert!(driver
            .temporary_url("a.txt", Expiration::Seconds(MAX_PRESIGN_SECONDS + 1), &options, "GET")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_file_exists_and_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/media/a.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/plain")
                    .insert_header("last-modified", "Thu, 01 Jan 2015 00:00:00 GMT"),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/media/gone.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/media/private.txt"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        assert!(driver.file_exists("/a.txt").await.unwrap());
        assert!(!driver.file_exists("gone.txt").await.unwrap());
        assert!(!driver.file_exists("private.txt").await.unwrap());
        assert!(!driver.directory_exists("private.txt").await.unwrap());

        let meta = driver.mime_type("a.txt").await.unwrap();
        assert_eq!(meta.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.last_modified, Some(1420070400));

        assert!(matches!(
            driver.metadata("gone.txt").await,
            Err(StorageError::UnableToRetrieveMetadata { .. })
        ));
        match driver.delete("gone.txt").await {
            Err(StorageError::UnableToDeleteFile { location, .. }) => assert_eq!(location, "gone.txt"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/docs/a.txt"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/media/docs/a.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello oss".to_vec()))
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        driver
            .write("docs/a.txt", Bytes::from_static(b"hello oss"), &WriteOptions::with_mime("text/plain"))
            .await
            .unwrap();
        assert_eq!(driver.read("docs/a.txt").await.unwrap(), Bytes::from_static(b"hello oss"));

        let mut reader = driver.read_stream("/docs/a.txt").await.unwrap();
        let mut streamed = Vec::new();
        reader.read_to_end(&mut streamed).await.unwrap();
        assert_eq!(streamed, b"hello oss");
    }

    #[tokio::test]
    async fn test_read_and_write_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/missing.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/media/denied.txt"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        assert!(matches!(driver.read("missing.txt").await, Err(StorageError::UnableToReadFile { .. })));
        assert!(matches!(
            driver.write("denied.txt", Bytes::from_static(b"x"), &WriteOptions::default()).await,
            Err(StorageError::UnableToWriteFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_contents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("list-type", "2"))
            .and(query_param("prefix", "docs/"))
            .and(query_param("delimiter", "/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>media</Name>
  <Prefix>docs/</Prefix>
  <Delimiter>/</Delimiter>
  <MaxKeys>1000</MaxKeys>
  <KeyCount>2</KeyCount>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>docs/</Key>
    <LastModified>2015-01-01T00:00:00.000Z</LastModified>
    <ETag>"d41d8cd98f00b204e9800998ecf8427e"</ETag>
    <Size>0</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
  <Contents>
    <Key>docs/a.txt</Key>
    <LastModified>2015-01-01T00:00:00.000Z</LastModified>
    <ETag>"5d41402abc4b2a76b9719d911017c592"</ETag>
    <Size>5</Size>
    <StorageClass>STANDARD</StorageClass>
  </Contents>
</ListBucketResult>"#,
            ))
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        let files: Vec<FileAttributes> = driver.list_contents("/docs", false).try_collect().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "docs/a.txt");
        assert_eq!(files[0].file_size, Some(5));
        assert_eq!(files[0].last_modified, Some(1420070400));
    }

    #[tokio::test]
    async fn test_list_contents_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("list-type", "2"))
            .and(query_param("prefix", "empty/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>media</Name>
  <Prefix>empty/</Prefix>
  <Delimiter>/</Delimiter>
  <MaxKeys>1000</MaxKeys>
  <KeyCount>0</KeyCount>
  <IsTruncated>false</IsTruncated>
</ListBucketResult>"#,
            ))
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        let files: Vec<FileAttributes> = driver.list_contents("empty", false).try_collect().await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_copy_encodes_source() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/docs/b.txt"))
            .and(copy_source_is("media/docs%2Fa%20b.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COPY_RESULT))
            .expect(1)
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        driver
            .copy_file("/docs/a b.txt", "docs/b.txt", &WriteOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_move_copies_then_deletes_source() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/docs/c.txt"))
            .and(copy_source_is("media/docs%2Fa.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COPY_RESULT))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/media/docs/a.txt"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        driver
            .move_file("docs/a.txt", "docs/c.txt", &WriteOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_move_keeps_source_when_copy_fails() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/docs/c.txt"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let driver = driver_for(&server);
        match driver.move_file("docs/a.txt", "docs/c.txt", &WriteOptions::default()).await {
            Err(StorageError::UnableToMoveFile { from, to, .. }) => {
                assert_eq!(from, "docs/a.txt");
                assert_eq!(to, "docs/c.txt");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            driver.copy_file("docs/a.txt", "docs/c.txt", &WriteOptions::default()).await,
            Err(StorageError::UnableToCopyFile { .. })
        ));
    }
}
