//! 七牛表单上传

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use super::bucket::parse_response;
use super::types::{PutRet, QiniuError};

/// 表单上传客户端，本身无状态
pub struct UploadManager {
    client: Client,
    up_url: String,
}

impl UploadManager {
    pub fn new(client: Client, up_url: String) -> Self {
        Self { client, up_url }
    }

    /// 一次性上传整个文件
    ///
    /// `params` 中只有 `x:` 开头的自定义变量会被提交。
    pub async fn put(
        &self,
        up_token: &str,
        key: Option<&str>,
        data: Bytes,
        params: Option<&BTreeMap<String, String>>,
        mime: &str,
        fname: &str,
    ) -> Result<PutRet, QiniuError> {
        let size = data.len();
        let mut form = Form::new().text("token", up_token.to_string());
        if let Some(key) = key {
            form = form.text("key", key.to_string());
        }
        for (name, value) in params.into_iter().flatten() {
            if name.starts_with("x:") {
                form = form.text(name.clone(), value.clone());
            }
        }

        let part = Part::bytes(data.to_vec())
            .file_name(fname.to_string())
            .mime_str(mime)?;
        form = form.part("file", part);

        tracing::debug!("七牛上传: key={:?}, size={}, mime={}", key, size, mime);

        let resp = self.client
            .post(&self.up_url)
            .multipart(form)
            .send()
            .await?;

        parse_response(resp).await
    }
}
