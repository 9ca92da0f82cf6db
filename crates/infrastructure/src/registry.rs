use std::time::Duration;

use async_trait::async_trait;
use notifier_config::RegistryConfig;
use notifier_core::{NotifierError, NotifierResult, RawCatalog, RegistrySource};
use tracing::{debug, error};

/// 通过HTTP GET拉取分级登记表
pub struct HttpRegistrySource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpRegistrySource {
    pub fn new(config: &RegistryConfig) -> NotifierResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifierError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            url: config.url.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl RegistrySource for HttpRegistrySource {
    async fn fetch_registry_document(&self) -> NotifierResult<RawCatalog> {
        debug!("拉取注册表: {}", self.url);

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                error!("注册表请求失败: {}", e);
                NotifierError::RegistryFetch(format!("请求 {} 失败: {e}", self.url))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::RegistryFetch(format!(
                "请求 {} 返回 HTTP {status}",
                self.url
            )));
        }

        response
            .json::<RawCatalog>()
            .await
            .map_err(|e| NotifierError::RegistryFetch(format!("注册表解析失败: {e}")))
    }
}
