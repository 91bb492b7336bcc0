//! 试坑处理流程 - 流程层
//!
//! 核心职责：定义"一个试坑"的完整处理流程
//!
//! 单独报告流程顺序：
//! 1. 复制模板 → 示例标识替换 → 文本替换 → 字体
//! 2. 定位工作簿 → 逐个映射取值、格式化、写入表格
//! 3. 图片替换（启用时）
//! 4. 保存
//!
//! 汇总报告只复用第 2 步的取值部分。

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AppResult;
use crate::infrastructure::Document;
use crate::models::{CellMapping, CellSpec, CellValue, RunConfiguration};
use crate::orchestrator::events::Reporter;
use crate::services::table_injector::{self, InjectOutcome};
use crate::services::{
    font_format, image_service, locate_workbook, text_substitution, NumberFormatter,
    WorkbookReader,
};
use crate::workflow::specimen_ctx::SpecimenCtx;

/// 单个试坑的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResult {
    pub output_path: PathBuf,
    /// 映射 / 图片层面的警告数
    pub warnings: usize,
}

/// 试坑处理流程
///
/// - 编排一个试坑从模板到输出文件的全过程
/// - 不持有文档（每次从模板复制）
/// - 只依赖业务能力（services）
pub struct SpecimenFlow<'a> {
    config: &'a RunConfiguration,
    formatter: NumberFormatter,
}

impl<'a> SpecimenFlow<'a> {
    /// 创建新的试坑处理流程
    pub fn new(config: &'a RunConfiguration) -> Self {
        Self {
            config,
            formatter: NumberFormatter::new(config.number_format),
        }
    }

    /// 生成一份单独报告
    ///
    /// 找不到工作簿时返回错误（该试坑失败）；映射和图片的失败只记录警告。
    pub fn run(
        &self,
        template: &Document,
        ctx: &SpecimenCtx,
        reporter: &Reporter<'_>,
    ) -> AppResult<FlowResult> {
        reporter.info(format!("{} 🔄 开始处理", ctx));
        let mut document = template.clone();

        // ========== 文本与格式 ==========
        if !self.config.template_marker.is_empty() {
            text_substitution::apply(
                &mut document,
                &self.config.template_marker,
                &ctx.specimen_id,
            );
        }
        text_substitution::apply_all(&mut document, &self.config.text_replacements);
        font_format::apply_fonts(&mut document, &self.config.fonts);

        // ========== 表格数据 ==========
        let workbook = locate_workbook(&self.config.workbook_folders, &ctx.specimen_id)?;
        reporter.info(format!("{} 📗 工作簿: {}", ctx, workbook.display()));

        let table_font = self.config.fonts.table();
        let mut warnings = 0;
        match WorkbookReader::open(&workbook) {
            Ok(mut reader) => {
                for mapping in &self.config.mappings {
                    let text = match self.resolve_text(&mut reader, mapping) {
                        Ok(text) => text,
                        Err(e) => {
                            reporter.warn(format!(
                                "{} ⚠️ 映射 '{}' 取值失败: {}",
                                ctx, mapping.target_label, e
                            ));
                            warnings += 1;
                            continue;
                        }
                    };
                    match table_injector::inject_by_header(
                        &mut document,
                        &mapping.target_label,
                        &text,
                        &table_font,
                    ) {
                        InjectOutcome::Injected { rows } => reporter.info(format!(
                            "{} ✓ {} = '{}' ({} 行)",
                            ctx, mapping.target_label, text, rows
                        )),
                        InjectOutcome::HeaderNotFound => {
                            reporter.warn(format!(
                                "{} ⚠️ 文档中没有表头为 '{}' 的表格",
                                ctx, mapping.target_label
                            ));
                            warnings += 1;
                        }
                    }
                }
            }
            Err(e) => {
                // 工作簿存在但无法读取：每个映射各记一条
                for mapping in &self.config.mappings {
                    reporter.warn(format!(
                        "{} ⚠️ 映射 '{}' 取值失败: {}",
                        ctx, mapping.target_label, e
                    ));
                    warnings += 1;
                }
            }
        }

        // ========== 图片 ==========
        warnings += self.replace_images(&mut document, ctx.number, ctx, reporter);

        // ========== 保存 ==========
        let output_path = self.config.individual_output_path(ctx.number);
        document.save(&output_path)?;
        reporter.info(format!("{} ✅ 已保存: {}", ctx, output_path.display()));

        Ok(FlowResult {
            output_path,
            warnings,
        })
    }

    /// 汇总模式：读取一个试坑所有映射的值（行标签 → 文本）
    ///
    /// 找不到工作簿时返回错误；单个映射失败时该值为空字符串。
    pub fn collect_values(
        &self,
        ctx: &SpecimenCtx,
        reporter: &Reporter<'_>,
    ) -> AppResult<HashMap<String, String>> {
        let workbook = locate_workbook(&self.config.workbook_folders, &ctx.specimen_id)?;
        let mut values = HashMap::new();
        let mut reader = match WorkbookReader::open(&workbook) {
            Ok(reader) => Some(reader),
            Err(e) => {
                reporter.warn(format!("{} ⚠️ {}", ctx, e));
                None
            }
        };

        for mapping in &self.config.mappings {
            let text = match reader.as_mut().map(|r| self.resolve_text(r, mapping)) {
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    reporter.warn(format!(
                        "{} ⚠️ 映射 '{}' 取值失败: {}",
                        ctx, mapping.target_label, e
                    ));
                    String::new()
                }
                None => String::new(),
            };
            values.insert(mapping.target_label.clone(), text);
        }
        reporter.info(format!("{} ✓ 已读取 {} 个值", ctx, values.len()));
        Ok(values)
    }

    /// 为某个编号的试坑替换图片，返回警告数
    pub fn replace_images(
        &self,
        document: &mut Document,
        number: u32,
        label: &dyn std::fmt::Display,
        reporter: &Reporter<'_>,
    ) -> usize {
        if !self.config.image_mapping_enabled || self.config.image_rules.is_empty() {
            return 0;
        }
        let Some(root) = self.config.image_root.as_deref() else {
            reporter.warn(format!("{} ⚠️ 已启用图片替换但没有配置图片目录", label));
            return 1;
        };

        let report = image_service::process_specimen_images(
            document,
            root,
            number,
            &self.config.image_rules,
            self.config.fixed_image_height(),
        );
        for warning in &report.warnings {
            reporter.warn(format!("{} ⚠️ {}", label, warning));
        }
        if report.replaced > 0 {
            reporter.info(format!("{} 🖼️ 替换了 {} 张图片", label, report.replaced));
        }
        report.warnings.len()
    }

    fn resolve_text(
        &self,
        reader: &mut WorkbookReader,
        mapping: &CellMapping,
    ) -> AppResult<String> {
        let spec = CellSpec::parse(&mapping.cell_spec)?;
        let value: CellValue = reader.resolve(&mapping.sheet_name, &spec, mapping.aggregation)?;
        Ok(self.formatter.render(&self.formatter.apply(&value)))
    }
}
