use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;
use notifier_config::ChainConfig;
use notifier_core::{
    NetworkId, NotifierError, NotifierResult, TokenContract, TokenContractFactory,
};
use tracing::debug;

use crate::observability::MetricsCollector;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string memory);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// 通过JSON-RPC读取的ERC-20合约
pub struct AlloyTokenContract {
    address: Address,
    contract: IERC20::IERC20Instance<DynProvider>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AlloyTokenContract {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            address,
            contract: IERC20::new(address, provider),
            metrics: None,
        }
    }

    fn read_error(&self, err: impl std::fmt::Display) -> NotifierError {
        NotifierError::ContractRead {
            address: self.address,
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl TokenContract for AlloyTokenContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn decimals(&self) -> NotifierResult<u8> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(|e| self.read_error(e))
    }

    async fn name(&self) -> NotifierResult<String> {
        self.contract
            .name()
            .call()
            .await
            .map_err(|e| self.read_error(e))
    }

    async fn balance_of(&self, owner: Address) -> NotifierResult<U256> {
        if let Some(metrics) = &self.metrics {
            metrics.record_balance_probe();
        }
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| self.read_error(e))
    }
}

/// 按网络持有只读provider，按地址构造合约句柄
pub struct AlloyTokenContracts {
    default_provider: DynProvider,
    networks: HashMap<String, DynProvider>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl AlloyTokenContracts {
    pub fn new(default_provider: DynProvider) -> Self {
        Self {
            default_provider,
            networks: HashMap::new(),
            metrics: None,
        }
    }

    pub fn with_network(mut self, name: impl Into<String>, provider: DynProvider) -> Self {
        self.networks.insert(name.into(), provider);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn from_config(config: &ChainConfig) -> NotifierResult<Self> {
        let mut contracts = Self::new(http_provider(&config.rpc_url)?);
        for (name, url) in &config.networks {
            contracts = contracts.with_network(name.clone(), http_provider(url)?);
        }
        Ok(contracts)
    }

    fn provider_for(&self, network: Option<&NetworkId>) -> NotifierResult<DynProvider> {
        match network {
            None => Ok(self.default_provider.clone()),
            Some(network) => self
                .networks
                .get(network.as_str())
                .cloned()
                .ok_or_else(|| NotifierError::UnknownNetwork(network.to_string())),
        }
    }
}

impl TokenContractFactory for AlloyTokenContracts {
    fn token_contract(
        &self,
        address: Address,
        network: Option<&NetworkId>,
    ) -> NotifierResult<Arc<dyn TokenContract>> {
        let provider = self.provider_for(network)?;
        debug!(token = %address, network = ?network, "构造代币合约句柄");

        let mut contract = AlloyTokenContract::new(address, provider);
        contract.metrics = self.metrics.clone();
        Ok(Arc::new(contract))
    }
}

fn http_provider(rpc_url: &str) -> NotifierResult<DynProvider> {
    let url = rpc_url
        .parse::<reqwest::Url>()
        .map_err(|e| NotifierError::Configuration(format!("无效的RPC地址 {rpc_url}: {e}")))?;

    Ok(ProviderBuilder::new().connect_http(url).erased())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Bytes;
    use alloy::providers::mock::Asserter;
    use alloy::sol_types::SolCall;

    fn mocked(asserter: Asserter) -> DynProvider {
        ProviderBuilder::new()
            .connect_mocked_client(asserter)
            .erased()
    }

    #[tokio::test]
    async fn test_reads_decimals_and_balance() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from(IERC20::decimalsCall::abi_encode_returns(&18u8)));
        asserter.push_success(&Bytes::from(IERC20::balanceOfCall::abi_encode_returns(
            &U256::from(42u64),
        )));

        let token = AlloyTokenContract::new(Address::repeat_byte(0x11), mocked(asserter));

        assert_eq!(token.decimals().await.unwrap(), 18);
        assert_eq!(
            token.balance_of(Address::repeat_byte(0x01)).await.unwrap(),
            U256::from(42u64)
        );
    }

    #[tokio::test]
    async fn test_rpc_failure_maps_to_contract_read() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("execution reverted");

        let token = AlloyTokenContract::new(Address::repeat_byte(0x11), mocked(asserter));
        let err = token.name().await.unwrap_err();

        match err {
            NotifierError::ContractRead { address, .. } => {
                assert_eq!(address, Address::repeat_byte(0x11))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_network_rejected() {
        let contracts = AlloyTokenContracts::new(mocked(Asserter::new()))
            .with_network("ropsten", mocked(Asserter::new()));

        assert!(contracts
            .token_contract(Address::ZERO, Some(&NetworkId::new("ropsten")))
            .is_ok());
        let err = contracts
            .token_contract(Address::ZERO, Some(&NetworkId::new("kovan")))
            .err()
            .unwrap();
        assert!(matches!(err, NotifierError::UnknownNetwork(_)));
    }

    #[test]
    fn test_invalid_rpc_url_rejected() {
        let config = ChainConfig {
            rpc_url: "not a url".to_string(),
            ..ChainConfig::default()
        };
        assert!(AlloyTokenContracts::from_config(&config).is_err());
    }
}
