// Driver package / 驱动包
pub mod oss;
pub mod qiniu;

use crate::storage::StorageManager;

/// Register all drivers to StorageManager / 注册所有驱动
pub async fn register_all(manager: &StorageManager) -> anyhow::Result<()> {
    // Register Aliyun OSS driver (S3 compatible API) / 注册阿里云OSS驱动
    manager.register_factory(Box::new(oss::OssDriverFactory)).await?;
    // Register Qiniu Kodo driver / 注册七牛云存储驱动
    manager.register_factory(Box::new(qiniu::QiniuDriverFactory)).await?;
    Ok(())
}
