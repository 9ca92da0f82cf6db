use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_observability::{ApiConfig, ObservabilityConfig},
    dispatcher::DispatcherConfig,
    endpoints::{ChainConfig, DeliveryConfig, RegistryConfig},
    notification::NotificationConfig,
    wallet::WalletConfig,
};
use crate::validation::ConfigValidator;

/// 环境变量前缀，如 NOTIFIER__DISPATCHER__SCHEDULE
pub const ENV_PREFIX: &str = "NOTIFIER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub chain: ChainConfig,
    pub delivery: DeliveryConfig,
    pub wallets: WalletConfig,
    pub dispatcher: DispatcherConfig,
    pub notification: NotificationConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = [
                "config/notifier.toml",
                "notifier.toml",
                "/etc/tranche-notifier/config.toml",
            ];

            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("wallets.keys")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.registry.validate()?;
        self.chain.validate()?;
        self.delivery.validate()?;
        self.wallets.validate()?;
        self.dispatcher.validate()?;
        self.notification.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}
