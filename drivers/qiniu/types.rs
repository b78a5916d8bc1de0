//! 七牛接口数据类型定义

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 资源不存在
pub const CODE_NO_SUCH_FILE: u32 = 612;

// ============ 错误 ============

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrResp {
    #[serde(default)]
    pub error: String,
}

/// 七牛接口调用错误
#[derive(Debug, thiserror::Error)]
pub enum QiniuError {
    /// 接口返回了非200状态
    #[error("qiniu api error {code}: {message}")]
    Api { code: u32, message: String },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// 有效期超出可表示的时间范围
    #[error("invalid expires: {0} seconds")]
    InvalidExpires(u64),
}

impl QiniuError {
    /// 接口自带的错误信息
    pub fn message(&self) -> String {
        match self {
            QiniuError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            QiniuError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ============ 资源管理 ============

/// stat 接口返回
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StatInfo {
    #[serde(default)]
    pub fsize: Option<u64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    /// 上传时间，单位100纳秒
    #[serde(default, rename = "putTime")]
    pub put_time: Option<i64>,
    #[serde(default, rename = "type")]
    pub file_type: Option<i32>,
    #[serde(default)]
    pub md5: Option<String>,
}

/// list 接口单个条目
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ListItem {
    pub key: String,
    #[serde(default)]
    pub fsize: Option<u64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default, rename = "putTime")]
    pub put_time: Option<i64>,
}

/// list 接口返回
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListFilesResult {
    #[serde(default)]
    pub items: Vec<ListItem>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default, rename = "commonPrefixes")]
    pub common_prefixes: Vec<String>,
}

// ============ 上传 ============

/// 表单上传返回
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PutRet {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// 上传策略，字段名与七牛文档一致
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PutPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_body_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_fetch_key: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_save_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_only: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detect_mime: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fsize_min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fsize_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_ops: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_notify_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_after_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_prefixal_scope: Option<i32>,
    /// 非标准字段，严格模式下丢弃
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============ CDN ============

/// 刷新/预取接口返回
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub invalid_urls: Option<Vec<String>>,
    #[serde(default)]
    pub invalid_dirs: Option<Vec<String>>,
    #[serde(default)]
    pub url_quota_day: i64,
    #[serde(default)]
    pub url_surplus_day: i64,
}
