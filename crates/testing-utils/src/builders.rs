//! Test data builders for registry documents and instruments

use notifier_core::{
    Address, Instrument, NotifierResult, RawCatalog, RawPool, RawTranche, SigningCredential,
};

/// Hardhat默认账户0的私钥
pub const TEST_CHANNEL_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Hardhat默认账户1的私钥
pub const TEST_SECONDARY_KEY: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub const TEST_CHANNEL_ID: &str = "element_tracker";

pub fn test_credential() -> NotifierResult<SigningCredential> {
    SigningCredential::from_hex_key(TEST_CHANNEL_ID, TEST_CHANNEL_KEY)
}

/// Builder for a single instrument whose three token addresses derive from one seed byte
pub struct InstrumentBuilder {
    instrument: Instrument,
}

impl InstrumentBuilder {
    pub fn new(seed: u8) -> Self {
        Self {
            instrument: Instrument {
                underlying: "dai".to_string(),
                expiration_timestamp: 1_600_000_000,
                contract_address: Address::repeat_byte(seed),
                principal_pool_address: Address::repeat_byte(seed.wrapping_add(1)),
                yield_pool_address: Address::repeat_byte(seed.wrapping_add(2)),
            },
        }
    }

    pub fn with_underlying(mut self, underlying: &str) -> Self {
        self.instrument.underlying = underlying.to_string();
        self
    }

    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.instrument.expiration_timestamp = expiration;
        self
    }

    pub fn build(self) -> Instrument {
        self.instrument
    }
}

/// Builder for the raw registry document
#[derive(Default)]
pub struct CatalogBuilder {
    catalog: RawCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instrument(mut self, instrument: &Instrument) -> Self {
        self.catalog
            .tranches
            .entry(instrument.underlying.clone())
            .or_default()
            .push(RawTranche {
                expiration: instrument.expiration_timestamp,
                address: instrument.contract_address,
                pt_pool: RawPool {
                    address: instrument.principal_pool_address,
                },
                yt_pool: RawPool {
                    address: instrument.yield_pool_address,
                },
            });
        self
    }

    pub fn build(self) -> RawCatalog {
        self.catalog
    }
}
