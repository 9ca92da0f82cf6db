//! 通知服务的核心类型
//!
//! 定义分级头寸（tranche）、余额探测结果、用户分发结果等数据模型，
//! 以及调度引擎依赖的外部能力接口（注册表、代币合约、通知投递、钱包密钥）。

pub mod errors;
pub mod models;
pub mod traits;

pub use errors::*;
pub use models::{
    DeliveryReceipt, Instrument, NetworkId, Notification, RawCatalog, RawPool, RawTranche,
    SimulationOptions, TokenBalanceResult, TrancheEvaluationResult, TrancheStatus,
    UserDispatchOutcome,
};
pub use traits::{
    DeliveryGateway, RegistrySource, SigningCredential, TokenContract, TokenContractFactory,
    WalletProvider,
};

pub use alloy::primitives::{Address, U256};
