use chrono::Utc;
use notifier_config::NotificationConfig;
use notifier_core::TrancheEvaluationResult;

const HEADER: &str = "[d:Expired Tranches & Latest Balance]\n---------";

/// 把持有的到期分级渲染成通知正文
#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    precision: usize,
    ticker_width: usize,
}

impl NotificationFormatter {
    pub fn new(precision: usize, ticker_width: usize) -> Self {
        Self {
            precision,
            ticker_width,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.precision, config.ticker_width)
    }

    pub fn format(&self, held: &[TrancheEvaluationResult]) -> String {
        self.format_at(held, Utc::now().timestamp())
    }

    /// 相同输入顺序与时间戳下输出确定
    pub fn format_at(&self, held: &[TrancheEvaluationResult], timestamp: i64) -> String {
        let body: String = held
            .iter()
            .filter_map(|tranche| tranche.token_owned.as_ref())
            .map(|token| {
                format!(
                    "\n[➕] [d:{}]  [b:{}] [d: Position has expired! Ready for redemption]",
                    self.label(&token.token_display_name),
                    self.round_balance(token.balance)
                )
            })
            .collect();

        format!("{HEADER}\n{body}[timestamp: {timestamp}]")
    }

    /// 名称最后一个词加冒号，不足宽度时右侧补空格
    fn label(&self, display_name: &str) -> String {
        let ticker = display_name
            .split_whitespace()
            .last()
            .unwrap_or_default();
        format!("{:<width$}", format!("{ticker}:"), width = self.ticker_width)
    }

    /// 按精确十进制展开保留 `precision` 位，恰好居中时进位，并去掉尾随的0
    fn round_balance(&self, balance: f64) -> String {
        // f64 的十进制展开有限，1100 位小数足以精确表示
        let exact = format!("{:.1100}", balance.abs());
        let precision = self.precision.min(1100);
        let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

        let mut digits: Vec<u8> = int_part
            .bytes()
            .chain(frac_part.bytes().take(precision))
            .map(|b| b - b'0')
            .collect();

        let round_up = frac_part
            .as_bytes()
            .get(precision)
            .is_some_and(|&b| b >= b'5');
        if round_up {
            let mut carried = true;
            for digit in digits.iter_mut().rev() {
                if *digit == 9 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    carried = false;
                    break;
                }
            }
            if carried {
                digits.insert(0, 1);
            }
        }

        let int_len = digits.len() - precision;
        let to_text = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
        let int_text = to_text(&digits[..int_len]);
        let frac_text = to_text(&digits[int_len..]);
        let frac_text = frac_text.trim_end_matches('0');

        if frac_text.is_empty() {
            int_text
        } else {
            format!("{int_text}.{frac_text}")
        }
    }
}

impl Default for NotificationFormatter {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_core::{Address, TokenBalanceResult, TrancheStatus, U256};

    fn held(name: &str, balance: f64) -> TrancheEvaluationResult {
        TrancheEvaluationResult {
            status: TrancheStatus::Held,
            token_owned: Some(TokenBalanceResult {
                owner_address: Address::repeat_byte(0x01),
                token_address: Address::repeat_byte(0x02),
                token_display_name: name.to_string(),
                raw_balance: U256::from(1u64),
                decimals: 18,
                balance,
            }),
            underlying: "dai".to_string(),
            expiration_timestamp: 1_600_000_000,
        }
    }

    #[test]
    fn test_single_line_rendering() {
        let formatter = NotificationFormatter::default();

        let payload = formatter.format_at(&[held("ptElement DAI", 123.456789)], 1_700_000_000);

        let expected = format!(
            "[d:Expired Tranches & Latest Balance]\n---------\n\n[➕] [d:{}]  [b:123.457] [d: Position has expired! Ready for redemption][timestamp: 1700000000]",
            format!("{:<24}", "DAI:")
        );
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_label_padded_to_width() {
        let formatter = NotificationFormatter::new(3, 24);
        let label = formatter.label("  LP Element Principal Token yvCurve-stETH  ");
        assert_eq!(label.len(), 24);
        assert!(label.starts_with("yvCurve-stETH:"));
    }

    #[test]
    fn test_long_label_not_truncated() {
        let formatter = NotificationFormatter::new(3, 4);
        assert_eq!(formatter.label("ptElement yvCurveLUSD"), "yvCurveLUSD:");
    }

    #[test]
    fn test_trailing_zeros_removed() {
        let formatter = NotificationFormatter::new(3, 24);
        assert_eq!(formatter.round_balance(1.5), "1.5");
        assert_eq!(formatter.round_balance(2.0), "2");
        assert_eq!(formatter.round_balance(0.0004), "0");
        assert_eq!(formatter.round_balance(0.0005001), "0.001");
    }

    #[test]
    fn test_exact_ties_round_up() {
        let formatter = NotificationFormatter::new(3, 24);
        assert_eq!(formatter.round_balance(0.0625), "0.063");
        assert_eq!(NotificationFormatter::new(2, 24).round_balance(0.125), "0.13");
        assert_eq!(NotificationFormatter::new(0, 24).round_balance(2.5), "3");
    }

    #[test]
    fn test_rounding_uses_stored_value_and_carries() {
        // 1.005 实际存储为 1.00499999...
        assert_eq!(NotificationFormatter::new(2, 24).round_balance(1.005), "1");
        assert_eq!(NotificationFormatter::new(3, 24).round_balance(9.9996), "10");
        assert_eq!(NotificationFormatter::new(3, 24).round_balance(0.0), "0");
    }

    #[test]
    fn test_tie_balance_in_rendered_line() {
        let formatter = NotificationFormatter::new(3, 24);
        let payload = formatter.format_at(&[held("ptElement DAI", 0.0625)], 1);
        assert!(payload.contains("[b:0.063]"));
    }

    #[test]
    fn test_multiple_lines_keep_input_order() {
        let formatter = NotificationFormatter::default();

        let payload = formatter.format_at(
            &[held("ptElement DAI", 1.0), held("ptElement USDC", 2.25)],
            42,
        );

        let dai = payload.find("DAI:").unwrap();
        let usdc = payload.find("USDC:").unwrap();
        assert!(dai < usdc);
        assert_eq!(payload.matches("[➕]").count(), 2);
        assert!(payload.ends_with("[timestamp: 42]"));
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let formatter = NotificationFormatter::default();
        let input = [held("ptElement DAI", 3.14159)];
        assert_eq!(formatter.format_at(&input, 7), formatter.format_at(&input, 7));
    }
}
