//! 内联图片标记（DrawingML）

use quick_xml::escape::escape;

/// 每厘米的 EMU 数
pub const EMU_PER_CM: f64 = 360_000.0;
/// 每英寸的 EMU 数
pub const EMU_PER_INCH: f64 = 914_400.0;
/// 图片没有分辨率信息时按 72 DPI 计算原始尺寸
pub const DEFAULT_DPI: f64 = 72.0;

/// 图片显示尺寸（EMU）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureSize {
    pub cx: u64,
    pub cy: u64,
}

impl PictureSize {
    /// 按像素计算原始尺寸
    pub fn natural(width_px: u32, height_px: u32) -> Self {
        let emu_per_px = EMU_PER_INCH / DEFAULT_DPI;
        Self {
            cx: (width_px as f64 * emu_per_px).round() as u64,
            cy: (height_px as f64 * emu_per_px).round() as u64,
        }
    }

    /// 固定高度（厘米）等比缩放；参数不可用时返回 `None`
    pub fn with_height_cm(width_px: u32, height_px: u32, height_cm: f64) -> Option<Self> {
        if width_px == 0 || height_px == 0 || !height_cm.is_finite() || height_cm <= 0.0 {
            return None;
        }
        let cy = height_cm * EMU_PER_CM;
        let cx = cy * width_px as f64 / height_px as f64;
        Some(Self {
            cx: cx.round() as u64,
            cy: cy.round() as u64,
        })
    }
}

/// 支持的图片扩展名（小写）
pub fn extension_of(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" => Some(ext),
        _ => None,
    }
}

pub fn content_type_of(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// 生成 `w:drawing` 内联图片片段
pub fn inline_picture_xml(rel_id: &str, picture_id: u32, file_name: &str, size: PictureSize) -> String {
    let name = escape(file_name);
    let PictureSize { cx, cy } = size;
    format!(
        concat!(
            r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
            r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        ),
        cx = cx,
        cy = cy,
        id = picture_id,
        name = name,
        rel = rel_id,
    )
}
