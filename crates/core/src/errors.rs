use alloy::primitives::Address;
use thiserror::Error;

/// 通知服务错误类型定义
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("注册表获取失败: {0}")]
    RegistryFetch(String),

    #[error("合约读取失败: {address} - {message}")]
    ContractRead { address: Address, message: String },

    #[error("余额探测失败: 用户 {owner} 合约 {token} - {message}")]
    Probe {
        owner: Address,
        token: Address,
        message: String,
    },

    #[error("订阅者列表获取失败: {0}")]
    SubscriberFetch(String),

    #[error("通知投递失败: {0}")]
    Delivery(String),

    #[error("钱包密钥错误: {0}")]
    Wallet(String),

    #[error("未配置的网络: {0}")]
    UnknownNetwork(String),

    #[error("无效的参数: {0}")]
    InvalidArgument(String),

    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl NotifierError {
    /// 注册表或合约读取类错误
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            NotifierError::RegistryFetch(_)
                | NotifierError::ContractRead { .. }
                | NotifierError::SubscriberFetch(_)
        )
    }

    /// 把合约读取错误归类为某个用户的探测失败
    pub fn into_probe_failure(self, owner: Address) -> Self {
        match self {
            NotifierError::ContractRead { address, message } => NotifierError::Probe {
                owner,
                token: address,
                message,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for NotifierError {
    fn from(err: serde_json::Error) -> Self {
        NotifierError::Serialization(err.to_string())
    }
}

/// 统一的Result类型
pub type NotifierResult<T> = std::result::Result<T, NotifierError>;
