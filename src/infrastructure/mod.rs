//! 基础设施层
//!
//! 持有文档对象，只暴露读写能力

pub mod docx;

pub use docx::{Document, ImageHandle, PictureSize, RunFont};
