//! Generic filesystem facade / 通用文件系统门面
//!
//! What application code holds on to: one `Filesystem` per configured disk,
//! whatever backend sits behind it.

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;

use super::{
    Expiration, FileAttributes, ReadStream, Result, StorageAdapter, UrlOptions, Visibility,
    WriteOptions,
};

#[derive(Clone)]
pub struct Filesystem {
    adapter: Arc<dyn StorageAdapter>,
}

impl Filesystem {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub fn driver_name(&self) -> &str {
        self.adapter.name()
    }

    /// Borrow the concrete adapter (e.g. for Qiniu upload tokens) / 获取具体适配器
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.adapter.as_any().downcast_ref::<T>()
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        self.adapter.file_exists(path).await
    }

    pub async fn missing(&self, path: &str) -> Result<bool> {
        Ok(!self.exists(path).await?)
    }

    pub async fn directory_exists(&self, path: &str) -> Result<bool> {
        self.adapter.directory_exists(path).await
    }

    pub async fn get(&self, path: &str) -> Result<Bytes> {
        self.adapter.read(path).await
    }

    pub async fn read_stream(&self, path: &str) -> Result<ReadStream> {
        self.adapter.read_stream(path).await
    }

    /// Write with the mime type guessed from the extension / 按扩展名推断MIME后写入
    pub async fn put(&self, path: &str, contents: impl Into<Bytes>) -> Result<()> {
        let options = WriteOptions {
            mime: mime_guess::from_path(path).first_raw().map(str::to_string),
            ..WriteOptions::default()
        };
        self.adapter.write(path, contents.into(), &options).await
    }

    pub async fn put_with(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        options: &WriteOptions,
    ) -> Result<()> {
        self.adapter.write(path, contents.into(), options).await
    }

    pub async fn write_stream(
        &self,
        path: &str,
        contents: ReadStream,
        options: &WriteOptions,
    ) -> Result<()> {
        self.adapter.write_stream(path, contents, options).await
    }

    /// Delete every path, stopping at the first failure / 依次删除
    pub async fn delete(&self, paths: &[&str]) -> Result<()> {
        for path in paths {
            self.adapter.delete(path).await?;
        }
        Ok(())
    }

    pub async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.adapter.copy_file(from, to, &WriteOptions::default()).await
    }

    pub async fn move_file(&self, from: &str, to: &str) -> Result<()> {
        self.adapter.move_file(from, to, &WriteOptions::default()).await
    }

    pub async fn size(&self, path: &str) -> Result<u64> {
        let meta = self.adapter.file_size(path).await?;
        Ok(meta.file_size.unwrap_or_default())
    }

    pub async fn mime_type(&self, path: &str) -> Result<String> {
        let meta = self.adapter.mime_type(path).await?;
        Ok(meta.mime_type.unwrap_or_default())
    }

    pub async fn last_modified(&self, path: &str) -> Result<i64> {
        let meta = self.adapter.last_modified(path).await?;
        Ok(meta.last_modified.unwrap_or_default())
    }

    pub async fn metadata(&self, path: &str) -> Result<FileAttributes> {
        self.adapter.metadata(path).await
    }

    /// Collect a listing / 收集列表结果
    pub async fn list(&self, directory: &str, deep: bool) -> Result<Vec<FileAttributes>> {
        self.adapter.list_contents(directory, deep).try_collect().await
    }

    pub async fn files(&self, directory: &str) -> Result<Vec<String>> {
        let list = self.list(directory, false).await?;
        Ok(list.into_iter().map(|f| f.path).collect())
    }

    pub async fn all_files(&self, directory: &str) -> Result<Vec<String>> {
        let list = self.list(directory, true).await?;
        Ok(list.into_iter().map(|f| f.path).collect())
    }

    pub async fn make_directory(&self, path: &str) -> Result<()> {
        self.adapter.create_directory(path, &WriteOptions::default()).await
    }

    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        self.adapter.delete_directory(path).await
    }

    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        self.adapter.set_visibility(path, visibility).await
    }

    pub async fn visibility(&self, path: &str) -> Result<Visibility> {
        let meta = self.adapter.visibility(path).await?;
        Ok(meta.visibility.unwrap_or(Visibility::Private))
    }

    pub fn url(&self, path: &str) -> Result<String> {
        self.adapter.url(path)
    }

    pub async fn temporary_url(
        &self,
        path: &str,
        expiration: impl Into<Expiration>,
        options: &UrlOptions,
    ) -> Result<String> {
        self.adapter
            .temporary_url(path, expiration.into(), options, "GET")
            .await
    }
}
