use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::Document;
use crate::models::{load_run_config, RunConfiguration, SpecimenRange};
use crate::orchestrator::{BatchEvent, BatchOrchestrator, BatchReport, StopFlag};
use crate::services::{image_service, LogWriter};
use crate::utils::logging::{
    init_log_file, log_progress, log_run_plan, log_startup, print_final_stats, summary_text,
};

/// 应用主结构
pub struct App {
    config: Config,
    run_config: RunConfiguration,
    log_writer: LogWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        // 加载运行配置
        let mut run_config = load_run_config(Path::new(&config.run_config_path))
            .await
            .with_context(|| format!("无法加载运行配置: {}", config.run_config_path))?;
        apply_range_overrides(&mut run_config, &config);

        let log_writer = LogWriter::with_path(&config.output_log_file);
        Ok(Self {
            config,
            run_config,
            log_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<Option<BatchReport>> {
        if self.config.analyze_only {
            analyze_template(&self.run_config.template_path)?;
            return Ok(None);
        }

        let problems = self.run_config.validate();
        if !problems.is_empty() {
            bail!("配置不完整:\n{}", problems.join("\n"));
        }
        log_run_plan(&self.run_config);

        let report = self.run_batch().await?;

        // 输出最终统计
        print_final_stats(&report, &self.config.output_log_file);
        if let Err(e) = self.log_writer.write_line(&summary_text(&report)).await {
            warn!("⚠️ 写入日志文件失败: {}", e);
        }

        Ok(Some(report))
    }

    /// 在工作线程中运行批次，主线程消费事件
    async fn run_batch(&self) -> Result<BatchReport> {
        let (tx, mut rx) = mpsc::unbounded_channel::<BatchEvent>();
        let stop = StopFlag::new();

        // Ctrl-C → 请求停止（当前试坑处理完后生效）
        let ctrl_c_stop = stop.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⏹️ 收到停止请求，当前试坑完成后停止");
                ctrl_c_stop.request_stop();
            }
        });

        let snapshot = self.run_config.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let mut orchestrator = BatchOrchestrator::new(snapshot, stop);
            orchestrator.run(&tx)
        });

        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::Log(line) => {
                    if let Err(e) = self.log_writer.write_line(&line.to_string()).await {
                        warn!("⚠️ 写入日志文件失败: {}", e);
                    }
                }
                BatchEvent::Progress { done, total } => {
                    if self.config.verbose_logging {
                        log_progress(done, total);
                    }
                }
                BatchEvent::Finished(status) => debug!("批次结束: {}", status.label()),
            }
        }

        let report = worker.await.context("批处理任务异常退出")?;
        ctrl_c.abort();
        Ok(report)
    }
}

/// 用环境变量中的编号覆盖配置文件的范围
fn apply_range_overrides(run_config: &mut RunConfiguration, config: &Config) {
    if config.specimen_start.is_none() && config.specimen_end.is_none() {
        return;
    }
    let start = config.specimen_start.unwrap_or(run_config.range.start);
    let end = config.specimen_end.unwrap_or(run_config.range.end);
    run_config.range = SpecimenRange::new(start, end);
    info!("🔢 使用环境变量中的编号范围: {} - {}", start, end);
}

/// 分析模板中的图片位置
fn analyze_template(template_path: &Path) -> Result<()> {
    let document = Document::open(template_path)
        .with_context(|| format!("无法打开模板: {}", template_path.display()))?;
    let handles = image_service::enumerate_images(&document);

    info!("{}", "=".repeat(60));
    info!("🔍 模板图片分析: {}", template_path.display());
    info!("🖼️ 共 {} 张图片", handles.len());
    for handle in &handles {
        info!("   - 位置 {}", handle.position);
    }
    info!("{}", "=".repeat(60));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_overrides() {
        let mut run_config = RunConfiguration {
            range: SpecimenRange::new(1, 10),
            ..Default::default()
        };
        let config = Config {
            specimen_end: Some(4),
            ..Default::default()
        };
        apply_range_overrides(&mut run_config, &config);
        assert_eq!(run_config.range, SpecimenRange::new(1, 4));
    }
}
