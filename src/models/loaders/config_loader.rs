use std::path::Path;

use tokio::fs;

use crate::error::{AppResult, ConfigError};
use crate::models::run_config::RunConfiguration;

/// 配置文件格式（按扩展名判断）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// 从文件加载运行配置
///
/// `.json` 文件按 JSON 解析，其余按 TOML 解析；缺省字段取默认值。
pub async fn load_run_config(path: &Path) -> AppResult<RunConfiguration> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ReadFailed {
            path: shown.clone(),
            source: Box::new(e),
        })?;

    let config = parse_run_config(&content, ConfigFormat::of(path)).map_err(|source| {
        ConfigError::ParseFailed {
            path: shown.clone(),
            source,
        }
    })?;

    tracing::info!(
        "已加载配置: {} (映射 {} 个, 替换 {} 个, 图片规则 {} 个)",
        shown,
        config.mappings.len(),
        config.text_replacements.len(),
        config.image_rules.len()
    );
    Ok(config)
}

/// 将运行配置保存到文件
pub async fn save_run_config(config: &RunConfiguration, path: &Path) -> AppResult<()> {
    let shown = path.display().to_string();
    let content = match ConfigFormat::of(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| write_failed(&shown, Box::new(e)))?,
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| write_failed(&shown, Box::new(e)))?
        }
    };

    fs::write(path, content)
        .await
        .map_err(|e| write_failed(&shown, Box::new(e)))?;

    tracing::info!("配置已保存: {}", shown);
    Ok(())
}

fn parse_run_config(
    content: &str,
    format: ConfigFormat,
) -> Result<RunConfiguration, Box<dyn std::error::Error + Send + Sync>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    })
}

fn write_failed(path: &str, source: Box<dyn std::error::Error + Send + Sync>) -> ConfigError {
    ConfigError::WriteFailed {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::of(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::of(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::of(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::of(Path::new("config")), ConfigFormat::Toml);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = parse_run_config(
            r#"
specimen_prefix = "P-"

[range]
start = 2
end = 4

[[mappings]]
target_label = "Humedad"
sheet_name = "Datos"
cell_spec = "C5"
aggregation = "average"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.specimen_prefix, "P-");
        assert_eq!(config.range.start, 2);
        assert_eq!(config.naming.base_name, "EMS CUSCO C-");
        assert_eq!(config.fixed_image_height(), Some(5.0));
        assert_eq!(config.mappings.len(), 1);
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfiguration {
            specimen_prefix: "P-".into(),
            ..Default::default()
        };
        for name in ["report_config.toml", "report_config.json"] {
            let path = dir.path().join(name);
            save_run_config(&config, &path).await.unwrap();
            assert_eq!(load_run_config(&path).await.unwrap(), config);
        }
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let err = load_run_config(Path::new("/nonexistent/report_config.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::ReadFailed { .. })));
    }
}
