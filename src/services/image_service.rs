//! 图片替换服务 - 业务能力层
//!
//! 职责：
//! - 按文档顺序列出图片位置
//! - 把指定位置的图片换成子目录中的图片
//! - 单条规则失败只记录警告，不影响其他规则

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult, ImageError};
use crate::infrastructure::{Document, ImageHandle, PictureSize};
use crate::models::ImagePositionRule;
use crate::services::image_folder;

/// 图片处理结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImagePassReport {
    /// 成功替换的图片数
    pub replaced: usize,
    /// 每条失败规则一行说明
    pub warnings: Vec<String>,
}

/// 按文档顺序列出图片（先顶层段落，再表格单元格）
pub fn enumerate_images(document: &Document) -> Vec<ImageHandle> {
    document.image_occurrences()
}

/// 替换一处图片
///
/// # 参数
/// - `document`: 文档
/// - `handle`: 图片位置
/// - `image_path`: 新图片文件
/// - `fixed_height_cm`: 固定高度（厘米）；为空或插入失败时使用原始尺寸
pub fn replace_image(
    document: &mut Document,
    handle: &ImageHandle,
    image_path: &Path,
    fixed_height_cm: Option<f64>,
) -> AppResult<()> {
    let label = image_path.display().to_string();
    if !image_path.is_file() {
        return Err(ImageError::ImageNotFound { path: label }.into());
    }
    let data = std::fs::read(image_path).map_err(|e| AppError::image_insert_failed(&label, e))?;
    let (width, height) =
        image::image_dimensions(image_path).map_err(|e| AppError::image_insert_failed(&label, e))?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| label.clone());

    let natural = PictureSize::natural(width, height);
    let fixed = fixed_height_cm.and_then(|h| PictureSize::with_height_cm(width, height, h));

    if let Some(size) = fixed {
        match document.replace_run_with_picture(&handle.run, &file_name, data.clone(), size) {
            Ok(()) => return Ok(()),
            Err(e) => debug!("固定高度插入失败，改用原始尺寸重试: {}", e),
        }
    }
    document
        .replace_run_with_picture(&handle.run, &file_name, data, natural)
        .map_err(|e| match e {
            AppError::Image(_) => e,
            other => AppError::image_insert_failed(label, other),
        })
}

/// 按规则替换文档中的图片
///
/// 文档位置和子目录序号都从 1 开始；任一侧越界只跳过该规则。
pub fn apply_rules(
    document: &mut Document,
    rules: &[ImagePositionRule],
    images: &[PathBuf],
    fixed_height_cm: Option<f64>,
) -> ImagePassReport {
    let handles = enumerate_images(document);
    let mut report = ImagePassReport::default();

    for rule in rules {
        let Some(handle) = rule
            .document_position
            .checked_sub(1)
            .and_then(|i| handles.get(i))
        else {
            report.warnings.push(format!(
                "文档中没有第 {} 张图片 (共 {} 张)",
                rule.document_position,
                handles.len()
            ));
            continue;
        };
        let Some(source) = rule.source_index.checked_sub(1).and_then(|i| images.get(i)) else {
            report.warnings.push(format!(
                "子目录中没有第 {} 张图片 (共 {} 张)",
                rule.source_index,
                images.len()
            ));
            continue;
        };
        match replace_image(document, handle, source, fixed_height_cm) {
            Ok(()) => {
                debug!(
                    "图片 {} ← {}",
                    rule.document_position,
                    source.display()
                );
                report.replaced += 1;
            }
            Err(e) => report
                .warnings
                .push(format!("图片位置 {}: {}", rule.document_position, e)),
        }
    }
    report
}

/// 为某个试坑执行图片替换：解析子目录、排序图片、应用规则
pub fn process_specimen_images(
    document: &mut Document,
    image_root: &Path,
    specimen_number: u32,
    rules: &[ImagePositionRule],
    fixed_height_cm: Option<f64>,
) -> ImagePassReport {
    let images = image_folder::resolve_specimen_folder(image_root, specimen_number)
        .and_then(|folder| image_folder::ordered_images(&folder));
    match images {
        Ok(images) => apply_rules(document, rules, &images, fixed_height_cm),
        Err(e) => ImagePassReport {
            replaced: 0,
            warnings: vec![e.to_string()],
        },
    }
}
