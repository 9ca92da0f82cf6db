//! 外部协作方的具体实现：注册表、链上代币合约、通知投递网关与频道钱包

pub mod delivery;
pub mod observability;
pub mod registry;
pub mod token;
pub mod wallet;

pub use delivery::HttpDeliveryGateway;
pub use observability::{MetricsCollector, StructuredLogger};
pub use registry::HttpRegistrySource;
pub use token::{AlloyTokenContract, AlloyTokenContracts};
pub use wallet::RotatingWalletProvider;
