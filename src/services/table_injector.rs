//! 表格写入服务
//!
//! - 单独报告：按表头找到列，写入该列所有数据行
//! - 汇总报告：表头对应试坑，首列对应映射标签

use std::collections::HashMap;

use tracing::debug;

use crate::infrastructure::{Document, RunFont};
use crate::models::ColumnMatch;

/// 汇总数据：试坑标识 → (行标签 → 文本)，保持试坑插入顺序
pub type ConsolidatedData = Vec<(String, HashMap<String, String>)>;

/// 按表头写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// 写入了若干数据行
    Injected { rows: usize },
    /// 没有任何表格的首行包含该表头
    HeaderNotFound,
}

/// 在第一个表头匹配的表格中，把值写入该列的每个数据行
///
/// # 参数
/// - `document`: 文档
/// - `target_label`: 表头文本（与去除首尾空白的单元格文本完全相等）
/// - `value`: 写入的文本
/// - `font`: 表格字体
pub fn inject_by_header(
    document: &mut Document,
    target_label: &str,
    value: &str,
    font: &RunFont,
) -> InjectOutcome {
    for table in document.tables() {
        let rows = document.table_rows(&table);
        let Some((header_row, data_rows)) = rows.split_first() else {
            continue;
        };
        let column = document
            .row_cells(header_row)
            .iter()
            .position(|cell| document.cell_text(cell).trim() == target_label);
        let Some(column) = column else {
            continue;
        };

        let mut written = 0;
        for row in data_rows {
            if let Some(cell) = document.row_cells(row).get(column).cloned() {
                document.set_cell_text(&cell, value, font);
                written += 1;
            }
        }
        debug!("列 '{}' 写入 {} 行: {}", target_label, written, value);
        return InjectOutcome::Injected { rows: written };
    }
    InjectOutcome::HeaderNotFound
}

/// 汇总写入，返回写入的单元格数
///
/// 每个表格：首行各列按匹配方式关联到试坑（按插入顺序，先匹配者优先）；
/// 之后每行以首列文本为标签，在关联列中写入该试坑对应标签的值。
pub fn inject_consolidated(
    document: &mut Document,
    data: &ConsolidatedData,
    matching: ColumnMatch,
    font: &RunFont,
) -> usize {
    let mut written = 0;
    for table in document.tables() {
        let rows = document.table_rows(&table);
        let Some((header_row, data_rows)) = rows.split_first() else {
            continue;
        };

        let columns: Vec<(usize, &HashMap<String, String>)> = document
            .row_cells(header_row)
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| {
                let header = document.cell_text(cell);
                data.iter()
                    .find(|(id, _)| header_matches(header.trim(), id, matching))
                    .map(|(_, values)| (idx, values))
            })
            .collect();
        if columns.is_empty() {
            continue;
        }

        for row in data_rows {
            let cells = document.row_cells(row);
            let Some(label_cell) = cells.first() else {
                continue;
            };
            let label = document.cell_text(label_cell).trim().to_string();
            for (idx, values) in &columns {
                let (Some(cell), Some(value)) = (cells.get(*idx), values.get(&label)) else {
                    continue;
                };
                document.set_cell_text(cell, value, font);
                written += 1;
            }
        }
    }
    written
}

/// 表头是否对应试坑标识
///
/// 空表头不参与匹配
pub fn header_matches(header: &str, specimen_id: &str, matching: ColumnMatch) -> bool {
    if header.is_empty() || specimen_id.is_empty() {
        return false;
    }
    match matching {
        ColumnMatch::Loose => header.contains(specimen_id) || specimen_id.contains(header),
        ColumnMatch::ExactToken => header
            .split(|c: char| c.is_whitespace() || "()[],;:/".contains(c))
            .any(|token| token == specimen_id),
    }
}
