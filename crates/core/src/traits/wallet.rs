use std::fmt;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::{NotifierError, NotifierResult};

/// 频道签名凭证
#[derive(Clone)]
pub struct SigningCredential {
    channel_id: String,
    signer: PrivateKeySigner,
}

impl SigningCredential {
    pub fn new(channel_id: impl Into<String>, signer: PrivateKeySigner) -> Self {
        Self {
            channel_id: channel_id.into(),
            signer,
        }
    }

    /// 从十六进制私钥构建，可带或不带 `0x` 前缀
    pub fn from_hex_key(channel_id: impl Into<String>, key: &str) -> NotifierResult<Self> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| NotifierError::Wallet(format!("私钥解析失败: {e}")))?;

        Ok(Self::new(channel_id, signer))
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// 频道所有者地址
    pub fn channel_address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("channel_id", &self.channel_id)
            .field("channel_address", &self.channel_address())
            .finish_non_exhaustive()
    }
}

/// 钱包密钥提供者
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn signing_credential(&self, channel_id: &str) -> NotifierResult<SigningCredential>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_channel_address_derived_from_key() {
        let credential = SigningCredential::from_hex_key("elf-tracker", KEY).unwrap();

        assert_eq!(
            credential.channel_address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(credential.channel_id(), "elf-tracker");
    }

    #[test]
    fn test_debug_output_hides_key() {
        let credential = SigningCredential::from_hex_key("elf-tracker", KEY).unwrap();
        let debug = format!("{credential:?}");

        assert!(!debug.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478"));
        assert!(debug.contains("elf-tracker"));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = SigningCredential::from_hex_key("elf-tracker", "not-a-key").unwrap_err();
        assert!(matches!(err, NotifierError::Wallet(_)));
    }
}
