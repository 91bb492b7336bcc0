//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 按编号范围驱动试坑处理流程，汇总每个试坑的结果。
//!
//! ## 状态
//!
//! ```text
//! READY → RUNNING → COMPLETED | COMPLETED_WITH_ERRORS | STOPPED | CRITICAL_ERROR
//! ```
//!
//! - 开始运行时配置已固定，运行期间不再读取外部状态
//! - 每个试坑开始前检查停止标志；已完成的试坑保留
//! - 单个试坑失败只记录，继续下一个
//! - 模板无法读取或输出无法写入时中止整个批次

use std::path::PathBuf;

use crate::error::AppError;
use crate::infrastructure::Document;
use crate::models::{ReportMode, RunConfiguration};
use crate::orchestrator::consolidated;
use crate::orchestrator::events::{EventSink, Reporter, StopFlag};
use crate::workflow::{SpecimenCtx, SpecimenFlow};

/// 批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Ready,
    Running,
    Completed,
    CompletedWithErrors,
    Stopped,
    CriticalError,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchStatus::Ready | BatchStatus::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Ready => "READY",
            BatchStatus::Running => "RUNNING",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            BatchStatus::Stopped => "STOPPED",
            BatchStatus::CriticalError => "CRITICAL_ERROR",
        }
    }
}

/// 单个试坑状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecimenStatus {
    Success,
    Failure,
}

/// 单个试坑的处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct SpecimenOutcome {
    pub specimen_id: String,
    pub number: u32,
    pub status: SpecimenStatus,
    pub error_detail: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl SpecimenOutcome {
    pub fn success(ctx: &SpecimenCtx, output_path: Option<PathBuf>) -> Self {
        Self {
            specimen_id: ctx.specimen_id.clone(),
            number: ctx.number,
            status: SpecimenStatus::Success,
            error_detail: None,
            output_path,
        }
    }

    pub fn failure(ctx: &SpecimenCtx, error: &AppError) -> Self {
        Self {
            specimen_id: ctx.specimen_id.clone(),
            number: ctx.number,
            status: SpecimenStatus::Failure,
            error_detail: Some(error.to_string()),
            output_path: None,
        }
    }
}

/// 批次结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// 已处理的试坑（按编号顺序）
    pub outcomes: Vec<SpecimenOutcome>,
    /// 计划处理的试坑数
    pub total: usize,
    /// 中止批次的致命错误
    pub critical_error: Option<String>,
}

impl BatchReport {
    fn new(total: usize) -> Self {
        Self {
            status: BatchStatus::Running,
            outcomes: Vec::new(),
            total,
            critical_error: None,
        }
    }

    pub fn successes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SpecimenStatus::Success)
            .count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SpecimenStatus::Failure)
            .count()
    }

    /// 循环跑完后的最终状态
    pub(crate) fn completed_status(&self) -> BatchStatus {
        if self.failures() == 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::CompletedWithErrors
        }
    }
}

/// 批量处理器
pub struct BatchOrchestrator {
    config: RunConfiguration,
    stop: StopFlag,
    status: BatchStatus,
}

impl BatchOrchestrator {
    /// 以配置快照创建处理器
    pub fn new(config: RunConfiguration, stop: StopFlag) -> Self {
        Self {
            config,
            stop,
            status: BatchStatus::Ready,
        }
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    /// 运行整个批次（阻塞，应在工作线程中调用）
    pub fn run(&mut self, sink: &dyn EventSink) -> BatchReport {
        let reporter = Reporter::new(sink);
        self.status = BatchStatus::Running;

        let numbers: Vec<u32> = self.config.range.numbers().collect();
        let mut report = BatchReport::new(numbers.len());
        reporter.info(format!(
            "🚀 开始处理 {} 个试坑 ({}{:02} - {}{:02})",
            numbers.len(),
            self.config.specimen_prefix,
            self.config.range.start,
            self.config.specimen_prefix,
            self.config.range.end
        ));

        match Document::open(&self.config.template_path) {
            Ok(template) => match self.config.report_mode {
                ReportMode::Individual => {
                    self.run_individual(&template, &numbers, &mut report, &reporter)
                }
                ReportMode::Consolidated => consolidated::run(
                    &self.config,
                    &template,
                    &numbers,
                    &self.stop,
                    &mut report,
                    &reporter,
                ),
            },
            Err(e) => {
                reporter.error(format!("❌ 致命错误: {}", e));
                report.status = BatchStatus::CriticalError;
                report.critical_error = Some(e.to_string());
            }
        }

        self.status = report.status;
        reporter.info(format!(
            "📊 {}: 成功 {} / 失败 {} / 共 {}",
            report.status.label(),
            report.successes(),
            report.failures(),
            report.total
        ));
        reporter.finished(report.status);
        report
    }

    fn run_individual(
        &self,
        template: &Document,
        numbers: &[u32],
        report: &mut BatchReport,
        reporter: &Reporter<'_>,
    ) {
        let flow = SpecimenFlow::new(&self.config);
        let total = numbers.len();

        for (i, &number) in numbers.iter().enumerate() {
            if self.stop.is_stop_requested() {
                reporter.warn(format!("⏹️ 已停止，剩余 {} 个试坑未处理", total - i));
                report.status = BatchStatus::Stopped;
                return;
            }

            let ctx = SpecimenCtx::new(number, self.config.specimen_id(number), i + 1, total);
            match flow.run(template, &ctx, reporter) {
                Ok(result) => {
                    report
                        .outcomes
                        .push(SpecimenOutcome::success(&ctx, Some(result.output_path)));
                }
                Err(e) if e.is_critical() => {
                    reporter.error(format!("{} ❌ 致命错误: {}", ctx, e));
                    report.outcomes.push(SpecimenOutcome::failure(&ctx, &e));
                    report.critical_error = Some(e.to_string());
                    report.status = BatchStatus::CriticalError;
                    return;
                }
                Err(e) => {
                    reporter.error(format!("{} ❌ 处理失败: {}", ctx, e));
                    report.outcomes.push(SpecimenOutcome::failure(&ctx, &e));
                }
            }
            reporter.progress(i + 1, total);
        }
        report.status = report.completed_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::events::NullSink;
    use crate::models::SpecimenRange;

    #[test]
    fn unreadable_template_is_critical() {
        let config = RunConfiguration {
            template_path: PathBuf::from("/nonexistent/plantilla.docx"),
            range: SpecimenRange::new(1, 3),
            ..Default::default()
        };
        let mut orchestrator = BatchOrchestrator::new(config, StopFlag::new());
        assert_eq!(orchestrator.status(), BatchStatus::Ready);
        let report = orchestrator.run(&NullSink);
        assert_eq!(report.status, BatchStatus::CriticalError);
        assert!(report.outcomes.is_empty());
        assert!(report.critical_error.is_some());
        assert_eq!(orchestrator.status(), BatchStatus::CriticalError);
    }

    #[test]
    fn status_labels() {
        assert_eq!(BatchStatus::CompletedWithErrors.label(), "COMPLETED_WITH_ERRORS");
        assert!(BatchStatus::Stopped.is_terminal());
        assert!(!BatchStatus::Running.is_terminal());
    }
}
