use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use notifier_config::WalletConfig;
use notifier_core::{NotifierError, NotifierResult, SigningCredential, WalletProvider};
use tracing::debug;

/// 频道钱包轮换：每次取凭证时按顺序换下一把私钥
pub struct RotatingWalletProvider {
    channels: HashMap<String, Vec<SigningCredential>>,
    cursor: AtomicUsize,
}

impl RotatingWalletProvider {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn with_channel(
        mut self,
        channel_id: &str,
        keys: &[String],
    ) -> NotifierResult<Self> {
        let credentials = keys
            .iter()
            .map(|key| SigningCredential::from_hex_key(channel_id, key))
            .collect::<NotifierResult<Vec<_>>>()?;

        self.channels.insert(channel_id.to_string(), credentials);
        Ok(self)
    }

    pub fn from_config(config: &WalletConfig) -> NotifierResult<Self> {
        Self::new().with_channel(&config.channel_id, &config.keys)
    }
}

impl Default for RotatingWalletProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for RotatingWalletProvider {
    async fn signing_credential(&self, channel_id: &str) -> NotifierResult<SigningCredential> {
        let credentials = self
            .channels
            .get(channel_id)
            .ok_or_else(|| NotifierError::Wallet(format!("未知的频道: {channel_id}")))?;

        if credentials.is_empty() {
            return Err(NotifierError::Wallet(format!(
                "频道 {channel_id} 未配置钱包私钥"
            )));
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % credentials.len();
        debug!(channel = channel_id, wallet_index = index, "选用频道钱包");
        Ok(credentials[index].clone())
    }
}
