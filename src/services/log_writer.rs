//! 日志写入服务 - 业务能力层
//!
//! 只负责"追加一行到日志文件"，不关心日志从哪里来

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// 日志文件写入服务
pub struct LogWriter {
    log_file_path: PathBuf,
}

impl LogWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_file_path
    }

    /// 追加一行（自动补换行）
    ///
    /// # 参数
    /// - `line`: 已格式化的日志行
    pub async fn write_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .with_context(|| format!("无法打开日志文件: {}", self.log_file_path.display()))?;

        let mut text = line.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        file.write_all(text.as_bytes()).await?;
        Ok(())
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::with_path("output.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::with_path(dir.path().join("log.txt"));
        tokio_test::block_on(async {
            writer.write_line("[2024-01-01 10:00:00] uno").await.unwrap();
            writer.write_line("[2024-01-01 10:00:01] dos\n").await.unwrap();
        });
        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            content,
            "[2024-01-01 10:00:00] uno\n[2024-01-01 10:00:01] dos\n"
        );
    }
}
