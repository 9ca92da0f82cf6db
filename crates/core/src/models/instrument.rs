use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// 已到期的分级头寸
///
/// 每个调度周期从注册表重新构建，构建后不可变，周期结束即丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 底层资产标识
    pub underlying: String,
    /// 到期时间（Unix秒）
    #[serde(rename = "expiration")]
    pub expiration_timestamp: i64,
    /// 本金代币合约地址
    #[serde(rename = "address")]
    pub contract_address: Address,
    /// 本金流动性池合约地址
    #[serde(rename = "ptPoolAddress")]
    pub principal_pool_address: Address,
    /// 收益流动性池合约地址
    #[serde(rename = "ytPoolAddress")]
    pub yield_pool_address: Address,
}

impl Instrument {
    /// 需要探测的代币合约，按固定顺序：本金代币、本金池、收益池
    pub fn token_addresses(&self) -> [Address; 3] {
        [
            self.contract_address,
            self.principal_pool_address,
            self.yield_pool_address,
        ]
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiration_timestamp < now
    }
}

/// 注册表原始文档: `{ "tranches": { <underlying>: [RawTranche, ...] } }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub tranches: BTreeMap<String, Vec<RawTranche>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTranche {
    pub expiration: i64,
    pub address: Address,
    #[serde(rename = "ptPool")]
    pub pt_pool: RawPool,
    #[serde(rename = "ytPool")]
    pub yt_pool: RawPool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPool {
    pub address: Address,
}

impl RawCatalog {
    /// 按 `expiration < now` 过滤，返回新构建的头寸列表
    pub fn expired_instruments(&self, now: i64) -> Vec<Instrument> {
        self.tranches
            .iter()
            .flat_map(|(underlying, records)| {
                records.iter().map(move |record| Instrument {
                    underlying: underlying.clone(),
                    expiration_timestamp: record.expiration,
                    contract_address: record.address,
                    principal_pool_address: record.pt_pool.address,
                    yield_pool_address: record.yt_pool.address,
                })
            })
            .filter(|instrument| instrument.is_expired_at(now))
            .collect()
    }
}
