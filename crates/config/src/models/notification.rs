use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// 通知文案与渲染参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub title: String,
    pub message: String,
    pub payload_title: String,
    pub category: u8,
    /// 余额保留的小数位
    pub precision: usize,
    /// 代币标签的对齐宽度
    pub ticker_width: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Element.fi Alert!".to_string(),
            message: "Expired Element Finance token balance in your wallet!".to_string(),
            payload_title: "Element Token ready for redemption!".to_string(),
            category: 3,
            precision: 3,
            ticker_width: 24,
        }
    }
}

impl ConfigValidator for NotificationConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.title, "notification.title")?;
        ValidationUtils::validate_not_empty(&self.message, "notification.message")?;
        ValidationUtils::validate_not_empty(&self.payload_title, "notification.payload_title")?;
        if self.precision > 18 {
            return Err(crate::ConfigError::Validation(
                "notification.precision must be less than or equal to 18".to_string(),
            ));
        }
        Ok(())
    }
}
