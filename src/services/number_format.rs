//! 数值格式化服务
//!
//! 只处理数值；文本、布尔和空值原样输出。
//! 舍入方式为四舍五入（远离零方向），舍入后不补零：整数保持整数，`12.30` 写成 `12.3`。

use crate::models::{CellValue, NumericFormatPolicy};

/// 超过该位数不再舍入
const MAX_DECIMALS: u32 = 15;

/// 按小数位数四舍五入（远离零方向）
///
/// # 参数
/// - `value`: 原始数值
/// - `decimals`: 小数位数
///
/// # 返回
/// 舍入后的数值；位数过大或结果溢出时返回原值
pub fn round_half_away(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() || decimals > MAX_DECIMALS {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// 数值格式化器
#[derive(Debug, Clone, Copy)]
pub struct NumberFormatter {
    policy: NumericFormatPolicy,
}

impl NumberFormatter {
    pub fn new(policy: NumericFormatPolicy) -> Self {
        Self { policy }
    }

    /// 对数值做舍入；非数值或未启用固定小数时原样返回
    pub fn apply(&self, value: &CellValue) -> CellValue {
        if !self.policy.fixed_decimals {
            return value.clone();
        }
        match value {
            CellValue::Float(x) => CellValue::Float(round_half_away(*x, self.policy.decimal_count)),
            other => other.clone(),
        }
    }

    /// 转为写入文档的文本
    pub fn render(&self, value: &CellValue) -> String {
        self.apply(value).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(count: u32) -> NumberFormatter {
        NumberFormatter::new(NumericFormatPolicy {
            fixed_decimals: true,
            decimal_count: count,
        })
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_half_away(12.345, 1), 12.3);
        assert_eq!(round_half_away(0.25, 1), 0.3);
        assert_eq!(round_half_away(-0.25, 1), -0.3);
        assert_eq!(round_half_away(7.0, 0), 7.0);
    }

    #[test]
    fn rounding_is_idempotent() {
        for x in [12.345, 0.05, -3.14159, 2.675, 99.95] {
            for d in 0..6 {
                let once = round_half_away(x, d);
                assert_eq!(round_half_away(once, d), once, "{x} @ {d}");
            }
        }
    }

    #[test]
    fn renders_rounded_value_without_padding() {
        let f = fixed(1);
        assert_eq!(f.render(&CellValue::Float(12.345)), "12.3");
        assert_eq!(f.render(&CellValue::Int(12)), "12");
        assert_eq!(f.render(&CellValue::Int(0)), "0");
        assert_eq!(f.render(&CellValue::Float(10.04)), "10.0");
        assert_eq!(fixed(2).render(&CellValue::Float(12.3)), "12.3");
        assert_eq!(fixed(2).render(&CellValue::Float(1.0)), "1.0");
    }

    #[test]
    fn leaves_non_numeric_alone() {
        let f = fixed(1);
        assert_eq!(f.render(&CellValue::Text("SM".into())), "SM");
        assert_eq!(f.render(&CellValue::Empty), "");
        assert_eq!(f.apply(&CellValue::Text("1.25".into())), CellValue::Text("1.25".into()));
    }

    #[test]
    fn disabled_policy_keeps_value() {
        let f = NumberFormatter::new(NumericFormatPolicy {
            fixed_decimals: false,
            decimal_count: 1,
        });
        assert_eq!(f.apply(&CellValue::Float(12.345)), CellValue::Float(12.345));
        assert_eq!(f.render(&CellValue::Float(12.345)), "12.345");
        assert_eq!(f.render(&CellValue::Int(12)), "12");
    }
}
