use alloy::primitives::{utils::format_units, Address, U256};
use serde::{Deserialize, Serialize};

use crate::{NotifierError, NotifierResult};

/// 单个代币合约针对单个用户的探测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalanceResult {
    #[serde(rename = "user")]
    pub owner_address: Address,
    #[serde(rename = "token")]
    pub token_address: Address,
    #[serde(rename = "name")]
    pub token_display_name: String,
    #[serde(rename = "rawBalance")]
    pub raw_balance: U256,
    pub decimals: u8,
    /// `raw_balance / 10^decimals`，未做展示精度处理
    pub balance: f64,
}

impl TokenBalanceResult {
    pub fn new(
        owner_address: Address,
        token_address: Address,
        token_display_name: String,
        raw_balance: U256,
        decimals: u8,
    ) -> NotifierResult<Self> {
        let balance = scale_balance(raw_balance, decimals)?;

        Ok(Self {
            owner_address,
            token_address,
            token_display_name,
            raw_balance,
            decimals,
            balance,
        })
    }

    /// 是否持有该代币；按原始整数比较，不受浮点精度影响
    pub fn is_held(&self) -> bool {
        !self.raw_balance.is_zero()
    }
}

/// 按代币精度把原始余额换算成十进制数值
pub fn scale_balance(raw_balance: U256, decimals: u8) -> NotifierResult<f64> {
    let formatted = format_units(raw_balance, decimals)
        .map_err(|e| NotifierError::Internal(format!("余额换算失败: {e}")))?;

    formatted
        .parse::<f64>()
        .map_err(|e| NotifierError::Internal(format!("余额解析失败: {formatted} - {e}")))
}
