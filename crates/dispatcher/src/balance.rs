use std::sync::Arc;

use notifier_core::{
    Address, Instrument, NetworkId, NotifierResult, TokenBalanceResult, TokenContract,
    TokenContractFactory,
};
use tracing::debug;

/// 针对单个用户、单个分级的多合约余额探测
#[derive(Clone)]
pub struct BalanceAggregator {
    contracts: Arc<dyn TokenContractFactory>,
}

impl BalanceAggregator {
    pub fn new(contracts: Arc<dyn TokenContractFactory>) -> Self {
        Self { contracts }
    }

    /// 读取精度、名称与原始余额；零余额同样返回
    pub async fn probe_token(
        &self,
        owner: Address,
        contract: &dyn TokenContract,
    ) -> NotifierResult<TokenBalanceResult> {
        let token = contract.address();
        let probe = async {
            let decimals = contract.decimals().await?;
            let name = contract.name().await?;
            let raw_balance = contract.balance_of(owner).await?;
            TokenBalanceResult::new(owner, token, name, raw_balance, decimals)
        };

        probe.await.map_err(|e| e.into_probe_failure(owner))
    }

    /// 分级的三个代币合约：本金代币、本金池、收益池
    pub fn contracts_for(
        &self,
        owner: Address,
        instrument: &Instrument,
        network: Option<&NetworkId>,
    ) -> NotifierResult<Vec<Arc<dyn TokenContract>>> {
        instrument
            .token_addresses()
            .into_iter()
            .map(|address| {
                self.contracts
                    .token_contract(address, network)
                    .map_err(|e| e.into_probe_failure(owner))
            })
            .collect()
    }

    /// 按顺序探测，返回第一个持有的代币并停止后续探测
    pub async fn first_held_token(
        &self,
        owner: Address,
        contracts: &[Arc<dyn TokenContract>],
    ) -> NotifierResult<Option<TokenBalanceResult>> {
        for contract in contracts {
            let result = self.probe_token(owner, contract.as_ref()).await?;
            if result.is_held() {
                debug!(
                    owner = %owner,
                    token = %result.token_address,
                    balance = result.balance,
                    "用户持有到期代币"
                );
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_core::{NotifierError, U256};
    use notifier_testing_utils::{InstrumentBuilder, MockTokenContracts};

    struct Fixture {
        contracts: MockTokenContracts,
        aggregator: BalanceAggregator,
        instrument: Instrument,
    }

    fn fixture() -> Fixture {
        let contracts = MockTokenContracts::new();
        let instrument = InstrumentBuilder::new(0x10).build();
        contracts.add_token(instrument.contract_address, "ptElement DAI", 18);
        contracts.add_token(instrument.principal_pool_address, "LP Element Principal Token DAI", 18);
        contracts.add_token(instrument.yield_pool_address, "LP Element Yield Token DAI", 18);

        Fixture {
            aggregator: BalanceAggregator::new(Arc::new(contracts.clone())),
            contracts,
            instrument,
        }
    }

    #[tokio::test]
    async fn test_probe_token_returns_zero_balance() {
        let f = fixture();
        let owner = Address::repeat_byte(0xaa);
        let token = f.contracts.token(f.instrument.contract_address).unwrap();

        let result = f.aggregator.probe_token(owner, token.as_ref()).await.unwrap();

        assert_eq!(result.balance, 0.0);
        assert!(!result.is_held());
        assert_eq!(result.token_display_name, "ptElement DAI");
    }

    #[tokio::test]
    async fn test_first_positive_short_circuits() {
        let f = fixture();
        let owner = Address::repeat_byte(0xaa);
        f.contracts
            .token(f.instrument.contract_address)
            .unwrap()
            .set_balance(owner, U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)));

        let handles = f.aggregator.contracts_for(owner, &f.instrument, None).unwrap();
        let held = f.aggregator.first_held_token(owner, &handles).await.unwrap().unwrap();

        assert_eq!(held.balance, 0.5);
        assert_eq!(held.token_address, f.instrument.contract_address);
        assert_eq!(
            f.contracts.token(f.instrument.principal_pool_address).unwrap().balance_calls(),
            0
        );
        assert_eq!(
            f.contracts.token(f.instrument.yield_pool_address).unwrap().balance_calls(),
            0
        );
    }

    #[tokio::test]
    async fn test_later_pool_balance_is_found() {
        let f = fixture();
        let owner = Address::repeat_byte(0xaa);
        f.contracts
            .token(f.instrument.yield_pool_address)
            .unwrap()
            .set_balance(owner, U256::from(1u64));

        let handles = f.aggregator.contracts_for(owner, &f.instrument, None).unwrap();
        let held = f.aggregator.first_held_token(owner, &handles).await.unwrap();

        assert_eq!(held.unwrap().token_display_name, "LP Element Yield Token DAI");
        assert_eq!(f.contracts.total_balance_calls(), 3);
    }

    #[tokio::test]
    async fn test_none_held_is_absent() {
        let f = fixture();
        let owner = Address::repeat_byte(0xaa);

        let handles = f.aggregator.contracts_for(owner, &f.instrument, None).unwrap();
        let held = f.aggregator.first_held_token(owner, &handles).await.unwrap();

        assert!(held.is_none());
    }

    #[tokio::test]
    async fn test_contract_error_is_probe_failure_not_absence() {
        let f = fixture();
        let owner = Address::repeat_byte(0xaa);
        f.contracts
            .token(f.instrument.principal_pool_address)
            .unwrap()
            .set_failing(true);

        let handles = f.aggregator.contracts_for(owner, &f.instrument, None).unwrap();
        let err = f.aggregator.first_held_token(owner, &handles).await.unwrap_err();

        match err {
            NotifierError::Probe { owner: o, token, .. } => {
                assert_eq!(o, owner);
                assert_eq!(token, f.instrument.principal_pool_address);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            f.contracts.token(f.instrument.yield_pool_address).unwrap().balance_calls(),
            0
        );
    }
}
