use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// 发往投递通道的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipient: Address,
    pub title: String,
    pub message: String,
    pub payload_title: String,
    pub payload_body: String,
    pub category: u8,
    pub simulate: bool,
}

/// 投递回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub recipient: Address,
    pub simulated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl DeliveryReceipt {
    pub fn simulated(recipient: Address) -> Self {
        Self {
            recipient,
            simulated: true,
            reference: None,
        }
    }
}
