//! 单元格引用语法
//!
//! 逗号分隔的引用列表，每项是单个单元格（`C5`）或矩形区域（`C5:E10`）。
//! 列字母不区分大小写，逗号两侧空白忽略；任一项格式错误则整体无效。

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

fn cell_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{1,3})([0-9]{1,6})$").expect("cell reference pattern is valid")
    })
}

/// 单元格坐标（从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    /// 解析 `A1` 形式的引用
    pub fn parse(text: &str) -> Option<Self> {
        let caps = cell_ref_pattern().captures(text)?;
        let col = caps[1]
            .chars()
            .map(|c| c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)
            .fold(0u32, |acc, d| acc * 26 + d);
        let row: u32 = caps[2].parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self {
            row: row - 1,
            col: col - 1,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let col: String = letters.iter().rev().collect();
        write!(f, "{}{}", col, self.row + 1)
    }
}

/// 引用列表中的一项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellToken {
    Single(CellRef),
    Range { start: CellRef, end: CellRef },
}

impl CellToken {
    /// 左上角与右下角
    pub fn bounds(&self) -> (CellRef, CellRef) {
        match *self {
            CellToken::Single(cell) => (cell, cell),
            CellToken::Range { start, end } => (start, end),
        }
    }

    /// 该项覆盖的单元格，区域按行优先顺序逐个产生
    pub fn cells(&self) -> impl Iterator<Item = CellRef> {
        let (start, end) = self.bounds();
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellRef { row, col }))
    }

    /// 与 `first`..=`last` 的交集；没有交集时返回 `None`
    pub fn clamp_to(&self, first: CellRef, last: CellRef) -> Option<CellToken> {
        let (start, end) = self.bounds();
        let lo = CellRef {
            row: start.row.max(first.row),
            col: start.col.max(first.col),
        };
        let hi = CellRef {
            row: end.row.min(last.row),
            col: end.col.min(last.col),
        };
        (lo.row <= hi.row && lo.col <= hi.col).then_some(CellToken::Range { start: lo, end: hi })
    }
}

/// 解析后的单元格引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    tokens: Vec<CellToken>,
}

impl CellSpec {
    pub fn parse(spec: &str) -> AppResult<Self> {
        let mut tokens = Vec::new();
        for raw in spec.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                return Err(AppError::invalid_cell_spec(spec, "存在空引用"));
            }
            let parsed = match token.split_once(':') {
                Some((a, b)) => {
                    let (a, b) = match (CellRef::parse(a.trim()), CellRef::parse(b.trim())) {
                        (Some(a), Some(b)) => (a, b),
                        _ => {
                            return Err(AppError::invalid_cell_spec(
                                spec,
                                format!("区域 '{token}' 格式错误"),
                            ))
                        }
                    };
                    CellToken::Range {
                        start: CellRef {
                            row: a.row.min(b.row),
                            col: a.col.min(b.col),
                        },
                        end: CellRef {
                            row: a.row.max(b.row),
                            col: a.col.max(b.col),
                        },
                    }
                }
                None => CellToken::Single(CellRef::parse(token).ok_or_else(|| {
                    AppError::invalid_cell_spec(spec, format!("单元格 '{token}' 格式错误"))
                })?),
            };
            tokens.push(parsed);
        }
        Ok(Self { tokens })
    }

    /// 引用格式是否合法
    pub fn validate(spec: &str) -> bool {
        Self::parse(spec).is_ok()
    }

    pub fn tokens(&self) -> &[CellToken] {
        &self.tokens
    }

    /// 按顺序展开所有单元格
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.tokens.iter().flat_map(|t| t.cells())
    }

    /// 只展开落在 `first`..=`last` 内的单元格（工作表已用区域之外的都是空值）
    pub fn cells_within(
        &self,
        first: CellRef,
        last: CellRef,
    ) -> impl Iterator<Item = CellRef> + '_ {
        self.tokens
            .iter()
            .filter_map(move |t| t.clamp_to(first, last))
            .flat_map(|t| t.cells())
    }
}

impl FromStr for CellSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cells() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef { row: 0, col: 0 }));
        assert_eq!(CellRef::parse("c5"), Some(CellRef { row: 4, col: 2 }));
        assert_eq!(CellRef::parse("AA10"), Some(CellRef { row: 9, col: 26 }));
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("ABCD1"), None);
        assert_eq!(CellRef::parse("A1234567"), None);
    }

    #[test]
    fn display_roundtrips() {
        for text in ["A1", "Z9", "AA10", "XFD999999"] {
            assert_eq!(CellRef::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn accepted_forms() {
        for spec in ["A1", "A1:A10", "C5,E7,F9", "C5:E10", " C5 , e7 ", "C5:E7,F9"] {
            assert!(CellSpec::validate(spec), "{spec}");
        }
    }

    #[test]
    fn rejected_forms() {
        for spec in ["", "C5,", "5C", "C5:", "C5:E7:F9", "C5;E7", "hoja!C5"] {
            assert!(!CellSpec::validate(spec), "{spec}");
        }
    }

    #[test]
    fn ranges_expand_row_major_and_normalise() {
        let spec = CellSpec::parse("B2:A1").unwrap();
        let cells: Vec<String> = spec.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, ["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn huge_range_is_clamped_to_used_area() {
        let spec = CellSpec::parse("A1:ZZZ999999, C5").unwrap();
        let first = CellRef { row: 0, col: 0 };
        let last = CellRef { row: 2, col: 1 };
        let cells: Vec<String> = spec
            .cells_within(first, last)
            .map(|c| c.to_string())
            .collect();
        assert_eq!(cells, ["A1", "B1", "A2", "B2", "A3", "B3"]);

        // 区域本身也是惰性展开的
        assert_eq!(spec.cells().take(3).count(), 3);
    }

    #[test]
    fn tokens_keep_order() {
        let spec: CellSpec = "E7, C5".parse().unwrap();
        let cells: Vec<String> = spec.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, ["E7", "C5"]);
    }
}
