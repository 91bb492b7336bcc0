//! 试坑处理上下文
//!
//! 封装"我正在处理第几个试坑"这一信息

use std::fmt::Display;

/// 试坑处理上下文
#[derive(Debug, Clone)]
pub struct SpecimenCtx {
    /// 试坑编号
    pub number: u32,

    /// 试坑标识（如 "C-01"）
    pub specimen_id: String,

    /// 在本批中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本批试坑总数
    pub total: usize,
}

impl SpecimenCtx {
    /// 创建新的试坑上下文
    pub fn new(number: u32, specimen_id: String, index: usize, total: usize) -> Self {
        Self {
            number,
            specimen_id,
            index,
            total,
        }
    }
}

impl Display for SpecimenCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[试坑 {} ({}/{})]",
            self.specimen_id, self.index, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let ctx = SpecimenCtx::new(3, "C-03".into(), 1, 10);
        assert_eq!(ctx.to_string(), "[试坑 C-03 (1/10)]");
    }
}
