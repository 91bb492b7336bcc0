//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 持有本次运行的配置快照
//! - 打开模板（失败即中止）
//! - 按编号顺序驱动 `SpecimenFlow`，检查停止标志
//! - 汇总每个试坑的结果
//!
//! ### `consolidated` - 汇总报告
//! - 收集所有试坑的值后一次写入
//!
//! ### `events` - 事件与停止标志
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 编号范围)
//!     ↓
//! workflow::SpecimenFlow (处理单个试坑)
//!     ↓
//! services (能力层：取值 / 格式化 / 替换 / 表格 / 图片)
//!     ↓
//! infrastructure (基础设施：Document)
//! ```

pub mod batch_processor;
pub mod consolidated;
pub mod events;

pub use batch_processor::{
    BatchOrchestrator, BatchReport, BatchStatus, SpecimenOutcome, SpecimenStatus,
};
pub use events::{BatchEvent, EventSink, LogLevel, LogLine, NullSink, Reporter, StopFlag};
