#![allow(dead_code)]

use std::sync::Arc;

use notifier_config::AppConfig;
use notifier_core::{Address, Instrument, U256};
use notifier_dispatcher::{DispatchEngine, EngineDependencies};
use notifier_infrastructure::MetricsCollector;
use notifier_testing_utils::{
    test_credential, CatalogBuilder, InstrumentBuilder, MockDeliveryGateway, MockRegistrySource,
    MockTokenContracts, MockWalletProvider,
};

pub struct Harness {
    pub registry: MockRegistrySource,
    pub contracts: MockTokenContracts,
    pub delivery: MockDeliveryGateway,
    pub wallets: MockWalletProvider,
    pub instruments: Vec<Instrument>,
    pub engine: Arc<DispatchEngine>,
}

impl Harness {
    pub fn new(subscribers: Vec<Address>, instruments: Vec<Instrument>, config: AppConfig) -> Self {
        let mut catalog = CatalogBuilder::new();
        let contracts = MockTokenContracts::new();
        for instrument in &instruments {
            catalog = catalog.with_instrument(instrument);
            contracts.add_token(instrument.contract_address, "ptElement DAI", 18);
            contracts.add_token(
                instrument.principal_pool_address,
                "LP Element Principal Token yvDAI",
                18,
            );
            contracts.add_token(instrument.yield_pool_address, "LP Element Yield Token yvDAI", 18);
        }

        let registry = MockRegistrySource::new(catalog.build());
        let delivery = MockDeliveryGateway::new(subscribers);
        let wallets = MockWalletProvider::new(test_credential().unwrap());

        let deps = EngineDependencies {
            registry: Arc::new(registry.clone()),
            contracts: Arc::new(contracts.clone()),
            delivery: Arc::new(delivery.clone()),
            wallets: Arc::new(wallets.clone()),
        };
        let engine = Arc::new(DispatchEngine::new(
            deps,
            &config,
            Arc::new(MetricsCollector::new()),
        ));

        Self {
            registry,
            contracts,
            delivery,
            wallets,
            instruments,
            engine,
        }
    }

    pub fn with_defaults(subscribers: Vec<Address>) -> Self {
        Self::new(
            subscribers,
            vec![InstrumentBuilder::new(0x10).build()],
            AppConfig::default(),
        )
    }

    /// 给用户在某个代币合约上设置以18位精度表示的整数余额
    pub fn give(&self, owner: Address, token: Address, whole_units: u64) {
        let raw = U256::from(whole_units) * U256::from(10u64).pow(U256::from(18u64));
        self.contracts.token(token).unwrap().set_balance(owner, raw);
    }
}

pub fn user(byte: u8) -> Address {
    Address::repeat_byte(byte)
}
