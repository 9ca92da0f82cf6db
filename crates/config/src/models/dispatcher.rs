use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 重试预算的计数范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope {
    /// 每个任务各自计数
    #[default]
    PerTask,
    /// 整个引擎共享一个计数器，耗尽时清零
    Shared,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_resubmissions: u32,
    pub scope: RetryScope,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_resubmissions: 5,
            scope: RetryScope::PerTask,
        }
    }
}

impl ConfigValidator for RetryConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        if self.max_resubmissions > 100 {
            return Err(crate::ConfigError::Validation(
                "dispatcher.retry.max_resubmissions must be less than or equal to 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub schedule: String,
    pub run_on_startup: bool,
    /// 同时处理的订阅者上限，缺省不限
    pub max_concurrent_users: Option<usize>,
    /// 单个订阅者并发探测的分级数上限，缺省不限
    pub max_concurrent_probes: Option<usize>,
    pub retry: RetryConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: "0 * * * * *".to_string(),
            run_on_startup: false,
            max_concurrent_users: None,
            max_concurrent_probes: None,
            retry: RetryConfig::default(),
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_cron(&self.schedule, "dispatcher.schedule")?;
        if let Some(limit) = self.max_concurrent_users {
            ValidationUtils::validate_count(limit, "dispatcher.max_concurrent_users")?;
        }
        if let Some(limit) = self.max_concurrent_probes {
            ValidationUtils::validate_count(limit, "dispatcher.max_concurrent_probes")?;
        }
        self.retry.validate()?;
        Ok(())
    }
}
