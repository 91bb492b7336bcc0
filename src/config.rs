/// 程序配置
///
/// 只包含进程级设置；报告本身的配置在 `RunConfiguration` 文件中。
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行配置文件路径（.toml 或 .json）
    pub run_config_path: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 只分析模板中的图片，不生成报告
    pub analyze_only: bool,
    // --- 覆盖配置文件中的编号范围 ---
    pub specimen_start: Option<u32>,
    pub specimen_end: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_config_path: "report_config.toml".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            analyze_only: false,
            specimen_start: None,
            specimen_end: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            run_config_path: std::env::var("RUN_CONFIG_PATH").unwrap_or(default.run_config_path),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            analyze_only: std::env::var("ANALYZE_ONLY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.analyze_only),
            specimen_start: std::env::var("SPECIMEN_START").ok().and_then(|v| v.parse().ok()).or(default.specimen_start),
            specimen_end: std::env::var("SPECIMEN_END").ok().and_then(|v| v.parse().ok()).or(default.specimen_end),
        }
    }
}
