//! 字体格式化服务
//!
//! 顶层段落的文本片段使用段落字体，表格单元格中的使用表格字体。

use crate::infrastructure::Document;
use crate::models::FontConfig;

/// 统一设置文档字体，返回处理的文本片段数
pub fn apply_fonts(document: &mut Document, fonts: &FontConfig) -> usize {
    let paragraph_font = fonts.paragraph();
    let table_font = fonts.table();
    let mut count = 0;

    for paragraph in document.body_paragraphs() {
        for run in document.runs(&paragraph) {
            document.set_run_font(&run, &paragraph_font);
            count += 1;
        }
    }
    for paragraph in document.table_paragraphs() {
        for run in document.runs(&paragraph) {
            document.set_run_font(&run, &table_font);
            count += 1;
        }
    }
    count
}
