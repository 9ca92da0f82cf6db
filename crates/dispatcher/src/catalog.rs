use std::sync::Arc;

use chrono::Utc;
use notifier_core::{Instrument, NotifierResult, RegistrySource};
use tracing::debug;

/// 到期分级目录；每次调用都重新拉取注册表，不做缓存
#[derive(Clone)]
pub struct TrancheCatalog {
    source: Arc<dyn RegistrySource>,
}

impl TrancheCatalog {
    pub fn new(source: Arc<dyn RegistrySource>) -> Self {
        Self { source }
    }

    /// 以当前时间过滤出已到期的分级
    pub async fn list_expired_instruments(&self) -> NotifierResult<Vec<Instrument>> {
        self.list_expired_at(Utc::now().timestamp()).await
    }

    pub async fn list_expired_at(&self, now: i64) -> NotifierResult<Vec<Instrument>> {
        let catalog = self.source.fetch_registry_document().await?;
        let expired = catalog.expired_instruments(now);

        debug!(
            underlyings = catalog.tranches.len(),
            expired = expired.len(),
            "已过滤到期分级"
        );
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_core::NotifierError;
    use notifier_testing_utils::{CatalogBuilder, InstrumentBuilder, MockRegistrySource};

    #[tokio::test]
    async fn test_only_past_expirations_are_returned() {
        let now = 1_700_000_000;
        let past = InstrumentBuilder::new(0x10).with_expiration(now - 10).build();
        let future = InstrumentBuilder::new(0x20).with_expiration(now + 10).build();
        let source = MockRegistrySource::new(
            CatalogBuilder::new()
                .with_instrument(&past)
                .with_instrument(&future)
                .build(),
        );
        let catalog = TrancheCatalog::new(Arc::new(source));

        let expired = catalog.list_expired_at(now).await.unwrap();

        assert_eq!(expired, vec![past]);
    }

    #[tokio::test]
    async fn test_every_call_refetches() {
        let source = MockRegistrySource::new(CatalogBuilder::new().build());
        let catalog = TrancheCatalog::new(Arc::new(source.clone()));

        catalog.list_expired_instruments().await.unwrap();
        catalog.list_expired_instruments().await.unwrap();

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let source = MockRegistrySource::default();
        source.fail_with("connection refused");
        let catalog = TrancheCatalog::new(Arc::new(source));

        let err = catalog.list_expired_instruments().await.unwrap_err();

        assert!(matches!(err, NotifierError::RegistryFetch(_)));
    }
}
