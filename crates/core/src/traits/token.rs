use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::{models::NetworkId, NotifierResult};

/// 只读的ERC-20代币合约
#[async_trait]
pub trait TokenContract: Send + Sync {
    fn address(&self) -> Address;

    async fn decimals(&self) -> NotifierResult<u8>;

    async fn name(&self) -> NotifierResult<String>;

    async fn balance_of(&self, owner: Address) -> NotifierResult<U256>;
}

/// 代币合约访问器
pub trait TokenContractFactory: Send + Sync {
    /// 获取指定地址的合约句柄；`network` 为空时使用默认网络
    fn token_contract(
        &self,
        address: Address,
        network: Option<&NetworkId>,
    ) -> NotifierResult<Arc<dyn TokenContract>>;
}
