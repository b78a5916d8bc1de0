//! 七牛云存储驱动（custom-qiniu）
//!
//! 对象读写、元数据、列举走七牛 up/rs/rsf 接口，公开链接由绑定域名拼接，
//! 临时链接为私有下载签名链接。另外提供上传凭证、回调校验和CDN刷新。

pub mod auth;
pub mod bucket;
pub mod cdn;
pub mod config;
pub mod driver;
pub mod factory;
pub mod types;
pub mod upload;

pub use config::{QiniuConfig, QiniuRegion};
pub use driver::QiniuDriver;
pub use factory::QiniuDriverFactory;
pub use types::{PutPolicy, QiniuError};
