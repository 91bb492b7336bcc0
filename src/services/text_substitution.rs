//! 文本替换服务
//!
//! 在顶层段落和表格单元格段落中查找原文；命中的段落整体重写为替换后的文本，
//! 段落内原有的片段格式不保留（字体由之后的格式化步骤统一设置）。

use tracing::debug;

use crate::infrastructure::Document;
use crate::models::TextReplacement;

/// 执行一次替换，返回被改写的段落数
///
/// 原文为空或未出现时不做任何修改
pub fn apply(document: &mut Document, original: &str, replacement: &str) -> usize {
    if original.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    for paragraph in document.paragraphs_in_order() {
        let text = document.paragraph_text(&paragraph);
        if text.contains(original) {
            document.rewrite_paragraph_text(&paragraph, &text.replace(original, replacement));
            rewritten += 1;
        }
    }
    if rewritten > 0 {
        debug!("替换 '{}' → '{}': {} 个段落", original, replacement, rewritten);
    }
    rewritten
}

/// 按列表顺序执行所有替换（后面的规则可以改写前面规则产生的文本）
pub fn apply_all(document: &mut Document, replacements: &[TextReplacement]) -> usize {
    replacements
        .iter()
        .map(|r| apply(document, &r.original, &r.replacement))
        .sum()
}
