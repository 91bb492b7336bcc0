//! 试坑编号与标识

use serde::{Deserialize, Serialize};

/// 试坑编号范围（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenRange {
    pub start: u32,
    pub end: u32,
}

impl Default for SpecimenRange {
    fn default() -> Self {
        Self { start: 1, end: 1 }
    }
}

impl SpecimenRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start >= 1 && self.end >= self.start
    }

    /// 范围内的试坑数量
    pub fn len(&self) -> usize {
        if self.is_valid() {
            (self.end - self.start + 1) as usize
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 升序遍历编号
    pub fn numbers(&self) -> impl Iterator<Item = u32> {
        let (start, end) = if self.is_valid() {
            (self.start, self.end)
        } else {
            (1, 0)
        };
        start..=end
    }
}

/// 由前缀和编号生成试坑标识，编号至少两位（1 → "C-01"）
pub fn specimen_id(prefix: &str, number: u32) -> String {
    format!("{prefix}{number:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(specimen_id("C-", 1), "C-01");
        assert_eq!(specimen_id("C-", 12), "C-12");
        assert_eq!(specimen_id("C-", 123), "C-123");
    }

    #[test]
    fn range_iteration_is_inclusive() {
        let range = SpecimenRange::new(3, 5);
        assert_eq!(range.numbers().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn invalid_range_is_empty() {
        let range = SpecimenRange::new(5, 3);
        assert!(!range.is_valid());
        assert!(range.is_empty());
        assert_eq!(range.numbers().count(), 0);
        assert!(!SpecimenRange::new(0, 2).is_valid());
    }
}
