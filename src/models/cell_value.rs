//! 从工作簿读取到的单元格值

use std::fmt;

use serde::{Deserialize, Serialize};

/// 单元格值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 数值单元格的浮点值；文本、布尔和空值返回 `None`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// 工作簿中的数值；没有小数部分的按整数保存
    pub fn from_number(x: f64) -> Self {
        if x.is_finite() && x.fract() == 0.0 && x.abs() < MAX_EXACT_INT {
            CellValue::Int(x as i64)
        } else {
            CellValue::Float(x)
        }
    }
}

/// 2^53，超过后浮点数不能精确表示整数
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{i}"),
            // 计算得到的整数值浮点数保留一位小数（平均值 2 写成 "2.0"）
            CellValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}
