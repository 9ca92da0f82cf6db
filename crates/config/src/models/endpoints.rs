use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

pub const DEFAULT_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/element-fi/elf-deploy/main/addresses/mainnet.json";

/// 分级登记表（registry）来源
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for RegistryConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_url(&self.url, "registry.url")?;
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds)?;
        Ok(())
    }
}

/// 链上只读访问：默认RPC加按网络名覆盖的RPC
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub networks: BTreeMap<String, String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            networks: BTreeMap::new(),
        }
    }
}

impl ConfigValidator for ChainConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_url(&self.rpc_url, "chain.rpc_url")?;
        for (name, url) in &self.networks {
            ValidationUtils::validate_not_empty(name, "chain.networks name")?;
            ValidationUtils::validate_url(url, &format!("chain.networks.{name}"))?;
        }
        Ok(())
    }
}

/// 通知投递网关
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub gateway_url: String,
    pub timeout_seconds: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:4000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ConfigValidator for DeliveryConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_url(&self.gateway_url, "delivery.gateway_url")?;
        ValidationUtils::validate_timeout_seconds(self.timeout_seconds)?;
        Ok(())
    }
}
