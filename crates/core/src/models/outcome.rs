use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::{Instrument, TokenBalanceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrancheStatus {
    Held,
    NotHeld,
}

/// 单个头寸针对单个用户的评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrancheEvaluationResult {
    pub status: TrancheStatus,
    pub token_owned: Option<TokenBalanceResult>,
    pub underlying: String,
    #[serde(rename = "expiration")]
    pub expiration_timestamp: i64,
}

impl TrancheEvaluationResult {
    pub fn from_probe(instrument: &Instrument, token_owned: Option<TokenBalanceResult>) -> Self {
        let status = match token_owned {
            Some(_) => TrancheStatus::Held,
            None => TrancheStatus::NotHeld,
        };

        Self {
            status,
            token_owned,
            underlying: instrument.underlying.clone(),
            expiration_timestamp: instrument.expiration_timestamp,
        }
    }

    pub fn is_held(&self) -> bool {
        self.status == TrancheStatus::Held
    }
}

/// 单个用户的分发结果，交给格式化和投递步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDispatchOutcome {
    pub success: bool,
    #[serde(rename = "user")]
    pub owner_address: Address,
    #[serde(rename = "userTranches")]
    pub held_tranches: Vec<TrancheEvaluationResult>,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UserDispatchOutcome {
    /// 由评估结果构建：只保留持有的头寸，顺序与评估顺序一致
    pub fn from_evaluations(owner_address: Address, results: Vec<TrancheEvaluationResult>) -> Self {
        let held_tranches: Vec<_> = results.into_iter().filter(|r| r.is_held()).collect();

        if held_tranches.is_empty() {
            return Self::skipped(
                owner_address,
                format!("No expired tranches for wallet: {owner_address}"),
            );
        }

        Self {
            success: true,
            owner_address,
            held_tranches,
            reason: None,
        }
    }

    pub fn channel_owner(owner_address: Address) -> Self {
        Self::skipped(owner_address, format!("Channel Owner User: {owner_address}"))
    }

    fn skipped(owner_address: Address, reason: String) -> Self {
        Self {
            success: false,
            owner_address,
            held_tranches: Vec::new(),
            reason: Some(reason),
        }
    }
}
