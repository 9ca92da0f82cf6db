use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// 网络标识，例如 `mainnet`、`ropsten`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// 模拟与测试覆盖选项
///
/// `simulate` 为真时控制流程不变，但投递通道不会真正发送。
/// `force_active_when_empty` 为真且调用方没有给出用户时，使用 `override_target_address`。
/// `override_network` 指定读取合约时使用的网络。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    pub simulate: bool,
    pub force_active_when_empty: bool,
    pub override_target_address: Option<Address>,
    pub override_network: Option<NetworkId>,
}

impl SimulationOptions {
    /// 定时任务使用的真实发送选项
    pub fn live() -> Self {
        Self::default()
    }

    pub fn simulated() -> Self {
        Self {
            simulate: true,
            ..Self::default()
        }
    }

    /// 决定本次评估的目标用户
    pub fn resolve_target(&self, user: Option<Address>) -> Option<Address> {
        match user {
            Some(user) => Some(user),
            None if self.force_active_when_empty => self.override_target_address,
            None => None,
        }
    }
}
