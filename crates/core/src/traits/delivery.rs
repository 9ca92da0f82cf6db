use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{
    models::{DeliveryReceipt, Notification},
    traits::SigningCredential,
    NotifierResult,
};

/// 通知投递通道
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// 获取频道的订阅者地址列表
    async fn list_subscribers(&self, credential: &SigningCredential) -> NotifierResult<Vec<Address>>;

    /// 发送通知；`notification.simulate` 为真时不真正发送
    async fn send_notification(
        &self,
        credential: &SigningCredential,
        notification: &Notification,
    ) -> NotifierResult<DeliveryReceipt>;
}
