use notifier_core::{Address, NetworkId, SimulationOptions};
use serde::Deserialize;

/// `simulate` 字段：布尔值，或者携带 `logicOverride` 的对象
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SimulateParam {
    Flag(bool),
    Override {
        #[serde(rename = "logicOverride", default)]
        logic_override: Option<LogicOverride>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicOverride {
    #[serde(default)]
    pub mode: bool,
    #[serde(default)]
    pub apply_to_addr: Option<Address>,
    #[serde(default)]
    pub network: Option<String>,
}

impl SimulateParam {
    /// 对象形式总是模拟发送；覆盖字段只在 `mode` 为真时生效
    pub fn into_options(self) -> SimulationOptions {
        match self {
            SimulateParam::Flag(simulate) => SimulationOptions {
                simulate,
                ..SimulationOptions::default()
            },
            SimulateParam::Override { logic_override } => {
                let active = logic_override.filter(|o| o.mode);
                SimulationOptions {
                    simulate: true,
                    force_active_when_empty: active.is_some(),
                    override_target_address: active.as_ref().and_then(|o| o.apply_to_addr),
                    override_network: active
                        .and_then(|o| o.network)
                        .map(NetworkId::new),
                }
            }
        }
    }
}

/// 分发端点共用的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub simulate: Option<SimulateParam>,
    #[serde(default)]
    pub user: Option<Address>,
    #[serde(default)]
    pub tranche: Option<usize>,
}

impl DispatchRequest {
    pub fn simulation_options(&self) -> SimulationOptions {
        self.simulate
            .clone()
            .map(SimulateParam::into_options)
            .unwrap_or_default()
    }
}
