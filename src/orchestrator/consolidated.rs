//! 汇总报告
//!
//! 一份模板、一次替换和格式化；逐个试坑读取数据，最后一次性写入并保存。
//! 中途停止时不保存任何文件。

use crate::infrastructure::Document;
use crate::models::RunConfiguration;
use crate::orchestrator::batch_processor::{BatchReport, BatchStatus, SpecimenOutcome};
use crate::orchestrator::events::{Reporter, StopFlag};
use crate::services::table_injector::{self, ConsolidatedData};
use crate::services::{font_format, text_substitution};
use crate::workflow::{SpecimenCtx, SpecimenFlow};

pub(crate) fn run(
    config: &RunConfiguration,
    template: &Document,
    numbers: &[u32],
    stop: &StopFlag,
    report: &mut BatchReport,
    reporter: &Reporter<'_>,
) {
    let flow = SpecimenFlow::new(config);
    let total = numbers.len();
    let mut document = template.clone();
    text_substitution::apply_all(&mut document, &config.text_replacements);
    font_format::apply_fonts(&mut document, &config.fonts);

    // ========== 读取所有试坑 ==========
    let mut data: ConsolidatedData = Vec::with_capacity(total);
    let mut contexts = Vec::with_capacity(total);
    for (i, &number) in numbers.iter().enumerate() {
        if stop.is_stop_requested() {
            reporter.warn("⏹️ 已停止，汇总报告未保存");
            report.status = BatchStatus::Stopped;
            return;
        }
        let ctx = SpecimenCtx::new(number, config.specimen_id(number), i + 1, total);
        match flow.collect_values(&ctx, reporter) {
            Ok(values) => {
                data.push((ctx.specimen_id.clone(), values));
                contexts.push((ctx, None));
            }
            Err(e) => {
                reporter.error(format!("{} ❌ {}", ctx, e));
                data.push((ctx.specimen_id.clone(), Default::default()));
                contexts.push((ctx, Some(e)));
            }
        }
        reporter.progress(i + 1, total);
    }

    // ========== 写入与保存 ==========
    let written = table_injector::inject_consolidated(
        &mut document,
        &data,
        config.consolidated_match,
        &config.fonts.table(),
    );
    reporter.info(format!("📋 汇总表格写入 {} 个单元格", written));

    if let Some(&first) = numbers.first() {
        let label = format!("[汇总 {}]", config.specimen_id(first));
        flow.replace_images(&mut document, first, &label, reporter);
    }

    let output_path = config.consolidated_output_path();
    if let Err(e) = document.save(&output_path) {
        reporter.error(format!("❌ 致命错误: {}", e));
        report.critical_error = Some(e.to_string());
        report.status = BatchStatus::CriticalError;
        return;
    }
    reporter.info(format!("✅ 汇总报告已保存: {}", output_path.display()));

    for (ctx, error) in contexts {
        report.outcomes.push(match error {
            None => SpecimenOutcome::success(&ctx, Some(output_path.clone())),
            Some(e) => SpecimenOutcome::failure(&ctx, &e),
        });
    }
    report.status = report.completed_status();
}
