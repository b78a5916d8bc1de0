//! 阿里云OSS驱动（custom-oss），通过S3兼容接口访问

pub mod config;
pub mod driver;
pub mod factory;

pub use config::OssConfig;
pub use driver::OssDriver;
pub use factory::OssDriverFactory;
