//! 批处理事件
//!
//! 工作线程与控制端之间只有两条通道：
//! - 控制端 → 工作线程：`StopFlag`（在两个试坑之间轮询）
//! - 工作线程 → 控制端：`BatchEvent`（只发不收，无需确认）

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::orchestrator::batch_processor::BatchStatus;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// 带时间戳的日志行
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// 批处理事件
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Log(LogLine),
    /// 已处理的试坑数 / 总数
    Progress { done: usize, total: usize },
    /// 最终状态
    Finished(BatchStatus),
}

/// 事件接收端
pub trait EventSink: Send {
    fn emit(&self, event: BatchEvent);
}

impl EventSink for UnboundedSender<BatchEvent> {
    fn emit(&self, event: BatchEvent) {
        // 接收端已关闭时丢弃
        let _ = self.send(event);
    }
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: BatchEvent) {}
}

/// 协作式停止标志
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 同时写 tracing 日志和发送事件
pub struct Reporter<'a> {
    sink: &'a dyn EventSink,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self { sink }
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.sink.emit(BatchEvent::Log(LogLine::new(LogLevel::Info, message)));
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.sink.emit(BatchEvent::Log(LogLine::new(LogLevel::Warn, message)));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.sink
            .emit(BatchEvent::Log(LogLine::new(LogLevel::Error, message)));
    }

    pub fn progress(&self, done: usize, total: usize) {
        self.sink.emit(BatchEvent::Progress { done, total });
    }

    pub fn finished(&self, status: BatchStatus) {
        self.sink.emit(BatchEvent::Finished(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_line_format() {
        let line = LogLine {
            timestamp: Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap(),
            level: LogLevel::Info,
            message: "✅ C-01 完成".into(),
        };
        assert_eq!(line.to_string(), "[2024-03-05 09:07:01] ✅ C-01 完成");
    }

    #[test]
    fn stop_flag_is_shared() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!flag.is_stop_requested());
        other.request_stop();
        assert!(flag.is_stop_requested());
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = Reporter::new(&tx);
        reporter.info("hola");
        reporter.progress(1, 3);
        match rx.try_recv().unwrap() {
            BatchEvent::Log(line) => assert_eq!(line.message, "hola"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            BatchEvent::Progress { done: 1, total: 3 }
        );
    }
}
