use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::{ReportMode, RunConfiguration};
use crate::orchestrator::{BatchReport, SpecimenStatus};

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n报告生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 试坑报告批量生成");
    info!("📄 配置文件: {}", config.run_config_path);
    if config.analyze_only {
        info!("🔍 只分析模板图片");
    }
    info!("{}", "=".repeat(60));
}

/// 记录本次运行计划
///
/// # 参数
/// - `run_config`: 运行配置
pub fn log_run_plan(run_config: &RunConfiguration) {
    let mode = match run_config.report_mode {
        ReportMode::Individual => "单独报告",
        ReportMode::Consolidated => "汇总报告",
    };
    info!("📋 模式: {}", mode);
    info!("📄 模板: {}", run_config.template_path.display());
    info!("📁 输出目录: {}", run_config.output_folder.display());
    info!(
        "🔢 编号范围: {} - {} (共 {} 个)",
        run_config.range.start,
        run_config.range.end,
        run_config.range.len()
    );
    info!(
        "🔗 映射 {} 个 | 文本替换 {} 个 | 图片规则 {} 个{}",
        run_config.mappings.len(),
        run_config.text_replacements.len(),
        run_config.image_rules.len(),
        if run_config.image_mapping_enabled { "" } else { " (未启用)" }
    );
}

/// 记录进度
///
/// # 参数
/// - `done`: 已处理数量
/// - `total`: 总数
pub fn log_progress(done: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("⏳ 进度: {}/{}", done, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 批次结果
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &BatchReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计 [{}]", report.status.label());
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.successes(), report.total);
    info!("❌ 失败: {}", report.failures());
    for outcome in report
        .outcomes
        .iter()
        .filter(|o| o.status == SpecimenStatus::Failure)
    {
        info!(
            "   - {}: {}",
            outcome.specimen_id,
            outcome.error_detail.as_deref().unwrap_or("未知错误")
        );
    }
    if let Some(error) = &report.critical_error {
        info!("💥 致命错误: {}", error);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 最终统计的纯文本形式（追加到日志文件）
pub fn summary_text(report: &BatchReport) -> String {
    format!(
        "{sep}\n状态: {}\n成功: {}/{}\n失败: {}\n{sep}\n",
        report.status.label(),
        report.successes(),
        report.total,
        report.failures(),
        sep = "=".repeat(60),
    )
}
