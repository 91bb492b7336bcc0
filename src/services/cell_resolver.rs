//! 单元格取值服务 - 业务能力层
//!
//! 只负责"从工作簿的某张表按引用取值"，不关心值写到哪里

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::error::{AppError, AppResult, WorkbookError};
use crate::models::{Aggregation, CellRef, CellSpec, CellValue};

/// 只读工作簿
///
/// 每个试坑打开一次，多个映射共用；工作表按需读取并缓存。
pub struct WorkbookReader {
    label: String,
    sheets: Sheets<BufReader<File>>,
    names: Vec<String>,
    cache: HashMap<String, Range<Data>>,
}

impl WorkbookReader {
    /// 打开工作簿
    pub fn open(path: &Path) -> AppResult<Self> {
        let label = path.display().to_string();
        if !path.is_file() {
            return Err(AppError::workbook_unreadable(
                label,
                std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在"),
            ));
        }
        let sheets = open_workbook_auto(path)
            .map_err(|e| AppError::workbook_unreadable(label.clone(), e))?;
        let names = sheets.sheet_names().to_vec();
        debug!("打开工作簿 {} (工作表: {})", label, names.join(", "));
        Ok(Self {
            label,
            sheets,
            names,
            cache: HashMap::new(),
        })
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.names
    }

    fn sheet(&mut self, name: &str) -> AppResult<&Range<Data>> {
        // 区分大小写的精确匹配
        if !self.names.iter().any(|n| n == name) {
            return Err(WorkbookError::SheetNotFound {
                sheet: name.to_string(),
                workbook: self.label.clone(),
            }
            .into());
        }
        if !self.cache.contains_key(name) {
            let range = self
                .sheets
                .worksheet_range(name)
                .map_err(|e| AppError::workbook_unreadable(self.label.clone(), e))?;
            self.cache.insert(name.to_string(), range);
        }
        self.cache.get(name).ok_or_else(|| {
            AppError::from(WorkbookError::SheetNotFound {
                sheet: name.to_string(),
                workbook: self.label.clone(),
            })
        })
    }

    /// 按引用和取值方式读取
    pub fn resolve(
        &mut self,
        sheet_name: &str,
        spec: &CellSpec,
        aggregation: Aggregation,
    ) -> AppResult<CellValue> {
        let range = self.sheet(sheet_name)?;
        // 已用区域之外的单元格都为空，不必逐个读取
        let (Some((first_row, first_col)), Some((last_row, last_col))) = (range.start(), range.end())
        else {
            return Ok(aggregate(std::iter::empty(), aggregation));
        };
        let first = CellRef {
            row: first_row,
            col: first_col,
        };
        let last = CellRef {
            row: last_row,
            col: last_col,
        };
        let values = spec.cells_within(first, last).map(|cell| {
            range
                .get_value((cell.row, cell.col))
                .map(to_cell_value)
                .unwrap_or_default()
        });
        Ok(aggregate(values, aggregation))
    }
}

/// 读取单个值（打开、取值、关闭）
pub fn resolve(
    workbook_path: &Path,
    sheet_name: &str,
    cell_spec: &str,
    aggregation: Aggregation,
) -> AppResult<CellValue> {
    let spec = CellSpec::parse(cell_spec)?;
    WorkbookReader::open(workbook_path)?.resolve(sheet_name, &spec, aggregation)
}

/// 汇总单元格值
///
/// - `Single`: 第一个非空值；全部为空时返回空值
/// - `Average`: 所有数值的平均值；没有数值时返回 0
pub fn aggregate(values: impl IntoIterator<Item = CellValue>, aggregation: Aggregation) -> CellValue {
    match aggregation {
        Aggregation::Single => values
            .into_iter()
            .find(|v| !v.is_empty())
            .unwrap_or_default(),
        Aggregation::Average => {
            let (sum, count) = values
                .into_iter()
                .filter_map(|v| v.as_f64())
                .fold((0.0, 0usize), |(sum, count), x| (sum + x, count + 1));
            if count == 0 {
                CellValue::Int(0)
            } else {
                CellValue::Float(sum / count as f64)
            }
        }
    }
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::from_number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::Text(naive.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Text(dt.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
