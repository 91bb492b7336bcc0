use anyhow::{bail, Result};
use calicata_report::{logger, App, BatchStatus, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if let Some(report) = report {
        if report.status == BatchStatus::CriticalError {
            bail!(
                "批次中止: {}",
                report.critical_error.unwrap_or_default()
            );
        }
    }

    Ok(())
}
