use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 频道签名钱包，按轮换顺序排列
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub channel_id: String,
    pub keys: Vec<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            channel_id: "element_tracker".to_string(),
            keys: Vec::new(),
        }
    }
}

// 私钥不落日志
impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("channel_id", &self.channel_id)
            .field("keys", &format_args!("[{} masked]", self.keys.len()))
            .finish()
    }
}

impl ConfigValidator for WalletConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.channel_id, "wallets.channel_id")?;
        for (index, key) in self.keys.iter().enumerate() {
            ValidationUtils::validate_private_key(key, &format!("wallets.keys[{index}]"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_debug_masks_keys() {
        let config = WalletConfig {
            channel_id: "element_tracker".to_string(),
            keys: vec![KEY.to_string()],
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("element_tracker"));
        assert!(rendered.contains("[1 masked]"));
        assert!(!rendered.contains("ac0974"));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let config = WalletConfig {
            channel_id: "element_tracker".to_string(),
            keys: vec![KEY.to_string(), "0xdeadbeef".to_string()],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wallets.keys[1]"));
    }
}
