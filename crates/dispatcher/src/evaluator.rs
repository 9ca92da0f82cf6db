use futures::{stream, StreamExt, TryStreamExt};
use notifier_core::{
    Address, Instrument, NetworkId, NotifierResult, TrancheEvaluationResult, UserDispatchOutcome,
};
use tracing::debug;

use crate::balance::BalanceAggregator;

/// 对单个用户并发评估全部到期分级
#[derive(Clone)]
pub struct TrancheEvaluator {
    aggregator: BalanceAggregator,
    max_concurrent_probes: Option<usize>,
}

impl TrancheEvaluator {
    pub fn new(aggregator: BalanceAggregator, max_concurrent_probes: Option<usize>) -> Self {
        Self {
            aggregator,
            max_concurrent_probes,
        }
    }

    /// 单个分级的评估
    pub async fn check_tranche(
        &self,
        owner: Address,
        instrument: &Instrument,
        network: Option<&NetworkId>,
    ) -> NotifierResult<TrancheEvaluationResult> {
        let contracts = self.aggregator.contracts_for(owner, instrument, network)?;
        let token_owned = self.aggregator.first_held_token(owner, &contracts).await?;
        Ok(TrancheEvaluationResult::from_probe(instrument, token_owned))
    }

    /// 频道所有者直接跳过；任一分级探测失败则整个用户评估失败
    pub async fn evaluate_user(
        &self,
        owner: Address,
        instruments: &[Instrument],
        channel_owner: Address,
        network: Option<&NetworkId>,
    ) -> NotifierResult<UserDispatchOutcome> {
        if owner == channel_owner {
            debug!(owner = %owner, "频道所有者，跳过评估");
            return Ok(UserDispatchOutcome::channel_owner(owner));
        }

        // 结果按分级顺序排列，与完成顺序无关
        let limit = self
            .max_concurrent_probes
            .unwrap_or(instruments.len())
            .max(1);

        let network = network.cloned();
        let results: Vec<TrancheEvaluationResult> = stream::iter(instruments.to_vec())
            .map(|instrument| {
                let evaluator = self.clone();
                let network = network.clone();
                async move {
                    evaluator
                        .check_tranche(owner, &instrument, network.as_ref())
                        .await
                }
            })
            .buffered(limit)
            .try_collect()
            .await?;

        Ok(UserDispatchOutcome::from_evaluations(owner, results))
    }
}
