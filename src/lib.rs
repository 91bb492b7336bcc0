//! # Calicata Report
//!
//! 从 Excel 工作簿读取试坑数据，填入 Word 模板，批量生成报告
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/docx` - Word 文档包读写、XML 树、段落 / 表格 / 图片操作
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理一个文档或一个工作簿
//! - `cell_resolver` - 按单元格引用取值
//! - `number_format` - 数值舍入
//! - `text_substitution` / `font_format` - 文本替换与字体
//! - `table_injector` - 按表头写入表格
//! - `image_service` / `image_folder` - 图片位置与替换
//! - `LogWriter` - 写日志文件能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个试坑"的完整处理流程
//! - `SpecimenCtx` - 上下文封装（编号 + 标识）
//! - `SpecimenFlow` - 流程编排（模板 → 替换 → 取值 → 写入 → 图片 → 保存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，状态机与结果汇总
//! - `orchestrator/consolidated` - 汇总报告
//! - `orchestrator/events` - 事件与停止标志
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::Document;
pub use models::RunConfiguration;
pub use orchestrator::{BatchOrchestrator, BatchReport, BatchStatus, StopFlag};
pub use workflow::{SpecimenCtx, SpecimenFlow};
