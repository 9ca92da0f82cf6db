use async_trait::async_trait;

use crate::{models::RawCatalog, NotifierResult};

/// 头寸注册表数据源
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// 获取完整的注册表文档，每次调用都重新获取
    async fn fetch_registry_document(&self) -> NotifierResult<RawCatalog>;
}
