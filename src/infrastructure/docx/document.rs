//! Word 文档 - 基础设施层
//!
//! 持有文档包和已解析的主文档树，只暴露段落 / 表格 / 文本片段层面的能力：
//! - 不认识试坑、映射
//! - 不处理批量流程

use std::path::Path;

use crate::error::{AppError, AppResult, DocumentError};
use crate::infrastructure::docx::drawing::{self, PictureSize};
use crate::infrastructure::docx::package::DocxPackage;
use crate::infrastructure::docx::xml::{parse_element, NodePath, XmlDocument, XmlElement, XmlNode};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// `w:rPr` 子元素顺序
const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof",
    "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern",
    "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd",
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath",
];

/// `w:pPr` 子元素顺序
const PPR_ORDER: &[&str] = &[
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr",
    "w:widowControl", "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs",
    "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct", "w:topLinePunct",
    "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd", "w:snapToGrid",
    "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents", "w:suppressOverlap",
    "w:jc", "w:textDirection", "w:textAlignment", "w:textboxTightWrap", "w:outlineLvl",
    "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr", "w:pPrChange",
];

/// `w:tcPr` 子元素顺序
const TCPR_ORDER: &[&str] = &[
    "w:cnfStyle", "w:tcW", "w:gridSpan", "w:hMerge", "w:vMerge", "w:tcBorders", "w:shd",
    "w:noWrap", "w:tcMar", "w:textDirection", "w:tcFitText", "w:vAlign", "w:hideMark",
];

/// 文本片段中承载可见文字的元素
const TEXT_BEARING: &[&str] = &["w:t", "w:tab", "w:br", "w:cr", "w:delText"];

/// 字体设置
#[derive(Debug, Clone, PartialEq)]
pub struct RunFont {
    pub name: String,
    /// 字号（磅）
    pub size_pt: f64,
}

/// 文档中的一处图片
///
/// `position` 从 1 开始，按文档顺序编号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub position: usize,
    pub run: NodePath,
}

/// Word 文档
#[derive(Debug, Clone)]
pub struct Document {
    package: DocxPackage,
    body: XmlDocument,
    relationships: XmlDocument,
    content_types: XmlDocument,
}

impl Document {
    /// 打开模板文档，失败属于致命错误
    pub fn open(path: &Path) -> AppResult<Self> {
        let package = DocxPackage::open(path)?;
        Self::from_package(package).map_err(|e| match e {
            AppError::Document(DocumentError::CriticalTemplateError { .. }) => e,
            other => AppError::template_unreadable(path.display().to_string(), other),
        })
    }

    /// 从已读取的包构建
    pub fn from_package(package: DocxPackage) -> AppResult<Self> {
        let body_xml = package
            .part_text(DOCUMENT_PART)?
            .ok_or_else(|| missing(DOCUMENT_PART))?;
        let body = XmlDocument::parse(DOCUMENT_PART, &body_xml)?;
        if body.root.first_child("w:body").is_none() {
            return Err(missing("w:body"));
        }

        let relationships = match package.part_text(DOCUMENT_RELS_PART)? {
            Some(xml) => XmlDocument::parse(DOCUMENT_RELS_PART, &xml)?,
            None => XmlDocument {
                root: XmlElement::new("Relationships").with_attr("xmlns", RELS_NS),
            },
        };

        let content_types_xml = package
            .part_text(CONTENT_TYPES_PART)?
            .ok_or_else(|| missing(CONTENT_TYPES_PART))?;
        let content_types = XmlDocument::parse(CONTENT_TYPES_PART, &content_types_xml)?;

        Ok(Self {
            package,
            body,
            relationships,
            content_types,
        })
    }

    /// 保存文档（写入失败属于致命错误）
    pub fn save(&mut self, path: &Path) -> AppResult<()> {
        self.package
            .set_part(DOCUMENT_PART, self.body.to_xml().into_bytes());
        self.package
            .set_part(DOCUMENT_RELS_PART, self.relationships.to_xml().into_bytes());
        self.package
            .set_part(CONTENT_TYPES_PART, self.content_types.to_xml().into_bytes());
        self.package.save(path)
    }

    fn body_path(&self) -> NodePath {
        self.body
            .root
            .child_indices("w:body")
            .into_iter()
            .take(1)
            .collect()
    }

    fn element(&self, path: &[usize]) -> Option<&XmlElement> {
        self.body.root.at_path(path)
    }

    fn element_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        self.body.root.at_path_mut(path)
    }

    fn children_named(&self, parent: &[usize], name: &str) -> Vec<NodePath> {
        self.element(parent)
            .map(|el| {
                el.child_indices(name)
                    .into_iter()
                    .map(|i| extend(parent, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========== 结构遍历 ==========

    /// 正文中的顶层段落
    pub fn body_paragraphs(&self) -> Vec<NodePath> {
        self.children_named(&self.body_path(), "w:p")
    }

    /// 正文中的顶层表格
    pub fn tables(&self) -> Vec<NodePath> {
        self.children_named(&self.body_path(), "w:tbl")
    }

    pub fn table_rows(&self, table: &[usize]) -> Vec<NodePath> {
        self.children_named(table, "w:tr")
    }

    /// 行中的单元格（每个 `w:tc` 只出现一次）
    pub fn row_cells_unique(&self, row: &[usize]) -> Vec<NodePath> {
        self.children_named(row, "w:tc")
    }

    /// 行中的单元格，按网格列展开（横向合并的单元格按 `gridSpan` 重复出现）
    pub fn row_cells(&self, row: &[usize]) -> Vec<NodePath> {
        let mut cells = Vec::new();
        for cell in self.row_cells_unique(row) {
            let span = self
                .element(&cell)
                .and_then(|tc| tc.first_child("w:tcPr"))
                .and_then(|pr| pr.first_child("w:gridSpan"))
                .and_then(|gs| gs.attr("w:val"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            for _ in 0..span {
                cells.push(cell.clone());
            }
        }
        cells
    }

    pub fn cell_paragraphs(&self, cell: &[usize]) -> Vec<NodePath> {
        self.children_named(cell, "w:p")
    }

    /// 所有表格中单元格的段落（按行、按单元格顺序）
    pub fn table_paragraphs(&self) -> Vec<NodePath> {
        let mut paragraphs = Vec::new();
        for table in self.tables() {
            for row in self.table_rows(&table) {
                for cell in self.row_cells_unique(&row) {
                    paragraphs.extend(self.cell_paragraphs(&cell));
                }
            }
        }
        paragraphs
    }

    /// 文档顺序的全部段落：先顶层段落，再表格段落
    pub fn paragraphs_in_order(&self) -> Vec<NodePath> {
        let mut paragraphs = self.body_paragraphs();
        paragraphs.extend(self.table_paragraphs());
        paragraphs
    }

    /// 段落中的文本片段（直接子元素 `w:r`）
    pub fn runs(&self, paragraph: &[usize]) -> Vec<NodePath> {
        self.children_named(paragraph, "w:r")
    }

    // ========== 文本 ==========

    /// 段落的拼接文本
    pub fn paragraph_text(&self, paragraph: &[usize]) -> String {
        let Some(p) = self.element(paragraph) else {
            return String::new();
        };
        p.child_elements()
            .filter(|(_, r)| r.name == "w:r")
            .map(|(_, r)| run_text(r))
            .collect()
    }

    /// 单元格文本（各段落以换行连接）
    pub fn cell_text(&self, cell: &[usize]) -> String {
        self.cell_paragraphs(cell)
            .iter()
            .map(|p| self.paragraph_text(p))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 重写整个段落的文字
    ///
    /// 清除所有文本片段中的文字，再在末尾写入一个新片段。
    /// 片段中的图片等非文字内容保留；只剩格式属性的片段被移除。
    pub fn rewrite_paragraph_text(&mut self, paragraph: &[usize], text: &str) {
        let Some(p) = self.element_mut(paragraph) else {
            return;
        };
        for node in p.children.iter_mut() {
            if let XmlNode::Element(run) = node {
                if run.name == "w:r" {
                    run.remove_children_where(|c| TEXT_BEARING.contains(&c.name.as_str()));
                }
            }
        }
        p.remove_children_where(|c| {
            c.name == "w:r" && c.child_elements().all(|(_, e)| e.name == "w:rPr")
        });
        p.children.push(XmlNode::Element(text_run(text, None)));
    }

    /// 设置单元格文字：只保留一个居中段落，垂直居中，应用字体
    pub fn set_cell_text(&mut self, cell: &[usize], text: &str, font: &RunFont) {
        let Some(tc) = self.element_mut(cell) else {
            return;
        };
        let mut ppr = tc
            .first_child("w:p")
            .and_then(|p| p.first_child("w:pPr"))
            .cloned()
            .unwrap_or_else(|| XmlElement::new("w:pPr"));
        ppr.upsert_ordered(XmlElement::new("w:jc").with_attr("w:val", "center"), PPR_ORDER);

        let mut tcpr = tc
            .first_child("w:tcPr")
            .cloned()
            .unwrap_or_else(|| XmlElement::new("w:tcPr"));
        tcpr.upsert_ordered(
            XmlElement::new("w:vAlign").with_attr("w:val", "center"),
            TCPR_ORDER,
        );

        let mut paragraph = XmlElement::new("w:p").with_child(ppr);
        if !text.is_empty() {
            paragraph = paragraph.with_child(text_run(text, Some(font)));
        }

        tc.children.clear();
        tc.children.push(XmlNode::Element(tcpr));
        tc.children.push(XmlNode::Element(paragraph));
    }

    /// 设置文本片段的字体和字号
    pub fn set_run_font(&mut self, run: &[usize], font: &RunFont) {
        if let Some(r) = self.element_mut(run) {
            apply_font(r, font);
        }
    }

    /// 文本片段的字体名和字号（半磅）
    pub fn run_font(&self, run: &[usize]) -> Option<(String, u32)> {
        let rpr = self.element(run)?.first_child("w:rPr")?;
        let name = rpr.first_child("w:rFonts")?.attr("w:ascii")?.to_string();
        let size = rpr.first_child("w:sz")?.attr("w:val")?.parse().ok()?;
        Some((name, size))
    }

    // ========== 图片 ==========

    /// 文本片段是否包含图片（`w:drawing` 或旧式 `w:pict`）
    pub fn run_has_image(&self, run: &[usize]) -> bool {
        self.element(run)
            .map(|r| r.has_descendant("w:drawing") || r.has_descendant("w:pict"))
            .unwrap_or(false)
    }

    /// 按文档顺序列出所有图片所在的文本片段
    pub fn image_occurrences(&self) -> Vec<ImageHandle> {
        self.paragraphs_in_order()
            .iter()
            .flat_map(|p| self.runs(p))
            .filter(|r| self.run_has_image(r))
            .enumerate()
            .map(|(i, run)| ImageHandle {
                position: i + 1,
                run,
            })
            .collect()
    }

    /// 清空文本片段内容并插入新的内联图片
    ///
    /// # 参数
    /// - `run`: 文本片段路径
    /// - `file_name`: 图片文件名（用于扩展名和描述）
    /// - `data`: 图片字节
    /// - `size`: 显示尺寸（EMU）
    pub fn replace_run_with_picture(
        &mut self,
        run: &[usize],
        file_name: &str,
        data: Vec<u8>,
        size: PictureSize,
    ) -> AppResult<()> {
        if self.element(run).is_none() {
            return Err(AppError::image_insert_failed(file_name, "文本片段不存在"));
        }
        let extension = drawing::extension_of(file_name)
            .ok_or_else(|| AppError::image_insert_failed(file_name, "不支持的图片格式"))?;

        let media_name = self.next_media_name(&extension);
        self.package.set_part(format!("word/{media_name}"), data);
        self.ensure_content_type(&extension);
        let rel_id = self.add_relationship(IMAGE_REL_TYPE, &media_name);
        self.ensure_root_namespaces();

        let picture_id = self.next_picture_id();
        let drawing_xml = drawing::inline_picture_xml(&rel_id, picture_id, file_name, size);
        let drawing_el = parse_element("drawing", &drawing_xml)?;

        let r = self
            .element_mut(run)
            .ok_or_else(|| AppError::image_insert_failed(file_name, "文本片段不存在"))?;
        r.remove_children_where(|c| c.name != "w:rPr");
        r.children.push(XmlNode::Element(drawing_el));
        Ok(())
    }

    fn next_media_name(&self, extension: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("media/image_sub{n}.{extension}");
            if !self.package.has_part(&format!("word/{candidate}")) {
                return candidate;
            }
            n += 1;
        }
    }

    fn ensure_content_type(&mut self, extension: &str) {
        let root = &mut self.content_types.root;
        let present = root.child_elements().any(|(_, e)| {
            e.name == "Default"
                && e.attr("Extension")
                    .map(|x| x.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
        });
        if !present {
            root.children.push(XmlNode::Element(
                XmlElement::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", drawing::content_type_of(extension)),
            ));
        }
    }

    fn add_relationship(&mut self, rel_type: &str, target: &str) -> String {
        let root = &mut self.relationships.root;
        let max_id = root
            .child_elements()
            .filter_map(|(_, e)| e.attr("Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let id = format!("rId{}", max_id + 1);
        root.children.push(XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.clone())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        ));
        id
    }

    fn ensure_root_namespaces(&mut self) {
        let root = &mut self.body.root;
        if root.attr("xmlns:wp").is_none() {
            root.set_attr("xmlns:wp", WP_NS);
        }
        if root.attr("xmlns:r").is_none() {
            root.set_attr("xmlns:r", R_NS);
        }
    }

    fn next_picture_id(&self) -> u32 {
        let mut max_id = 0;
        self.body.root.for_each_descendant(&mut |e| {
            if e.name == "wp:docPr" {
                if let Some(id) = e.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    max_id = max_id.max(id);
                }
            }
        });
        max_id + 1
    }

    /// 文档包中的某个部件（测试和诊断用）
    pub fn package_part(&self, name: &str) -> Option<&[u8]> {
        self.package.part(name)
    }
}

fn missing(part: &str) -> AppError {
    AppError::Document(DocumentError::MissingPart {
        part: part.to_string(),
    })
}

fn extend(parent: &[usize], index: usize) -> NodePath {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for (_, child) in run.child_elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.text()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn text_run(text: &str, font: Option<&RunFont>) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    if let Some(font) = font {
        apply_font(&mut run, font);
    }
    run.with_child(
        XmlElement::new("w:t")
            .with_attr("xml:space", "preserve")
            .with_text(text),
    )
}

fn apply_font(run: &mut XmlElement, font: &RunFont) {
    if run.first_child("w:rPr").is_none() {
        run.children
            .insert(0, XmlNode::Element(XmlElement::new("w:rPr")));
    }
    if let Some(rpr) = run.first_child_mut("w:rPr") {
        let mut fonts = rpr
            .first_child("w:rFonts")
            .cloned()
            .unwrap_or_else(|| XmlElement::new("w:rFonts"));
        fonts.set_attr("w:ascii", font.name.clone());
        fonts.set_attr("w:hAnsi", font.name.clone());
        rpr.upsert_ordered(fonts, RPR_ORDER);

        let half_points = (font.size_pt * 2.0).round().max(1.0) as u32;
        rpr.upsert_ordered(
            XmlElement::new("w:sz").with_attr("w:val", half_points.to_string()),
            RPR_ORDER,
        );
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{doc_with_body, CONTENT_TYPES};
    use super::*;

    #[test]
    fn paragraph_text_joins_runs() {
        let doc = doc_with_body(
            r#"<w:p><w:r><w:t>Calicata </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>C-01</w:t></w:r></w:p>"#,
        );
        let paragraphs = doc.body_paragraphs();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(doc.paragraph_text(&paragraphs[0]), "Calicata C-01");
    }

    #[test]
    fn rewrite_collapses_runs_but_keeps_pictures() {
        let mut doc = doc_with_body(
            r#"<w:p><w:r><w:t>a</w:t></w:r><w:r><w:drawing/></w:r><w:r><w:t>b</w:t></w:r></w:p>"#,
        );
        let p = doc.body_paragraphs()[0].clone();
        doc.rewrite_paragraph_text(&p, "xyz");
        assert_eq!(doc.paragraph_text(&p), "xyz");
        let runs = doc.runs(&p);
        assert_eq!(runs.len(), 2);
        assert!(doc.run_has_image(&runs[0]));
    }

    #[test]
    fn grid_span_repeats_cells() {
        let doc = doc_with_body(
            r#"<w:tbl><w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p/></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>"#,
        );
        let row = doc.table_rows(&doc.tables()[0])[0].clone();
        assert_eq!(doc.row_cells(&row).len(), 3);
        assert_eq!(doc.row_cells_unique(&row).len(), 2);
    }

    #[test]
    fn set_cell_text_centers_and_formats() {
        let mut doc = doc_with_body(
            r#"<w:tbl><w:tr><w:tc><w:tcPr><w:tcW w:w="100"/></w:tcPr><w:p><w:r><w:t>old</w:t></w:r></w:p><w:p/></w:tc></w:tr></w:tbl>"#,
        );
        let row = doc.table_rows(&doc.tables()[0])[0].clone();
        let cell = doc.row_cells(&row)[0].clone();
        let font = RunFont {
            name: "Arial".into(),
            size_pt: 10.0,
        };
        doc.set_cell_text(&cell, "12.3", &font);
        assert_eq!(doc.cell_text(&cell), "12.3");

        let tc = doc.element(&cell).unwrap();
        let tcpr = tc.first_child("w:tcPr").unwrap();
        assert!(tcpr.first_child("w:tcW").is_some());
        assert_eq!(tcpr.first_child("w:vAlign").unwrap().attr("w:val"), Some("center"));
        let p = tc.first_child("w:p").unwrap();
        let jc = p.first_child("w:pPr").unwrap().first_child("w:jc").unwrap();
        assert_eq!(jc.attr("w:val"), Some("center"));
        let rpr = p.first_child("w:r").unwrap().first_child("w:rPr").unwrap();
        assert_eq!(rpr.first_child("w:sz").unwrap().attr("w:val"), Some("20"));
        assert_eq!(rpr.first_child("w:rFonts").unwrap().attr("w:ascii"), Some("Arial"));
    }

    #[test]
    fn empty_cell_text_writes_no_run() {
        let mut doc = doc_with_body(r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#);
        let row = doc.table_rows(&doc.tables()[0])[0].clone();
        let cell = doc.row_cells(&row)[0].clone();
        let font = RunFont {
            name: "Calibri".into(),
            size_pt: 11.0,
        };
        doc.set_cell_text(&cell, "", &font);
        assert_eq!(doc.cell_text(&cell), "");
    }

    #[test]
    fn missing_body_is_rejected() {
        let mut pkg = DocxPackage::default();
        pkg.set_part(CONTENT_TYPES_PART, CONTENT_TYPES.as_bytes().to_vec());
        pkg.set_part(DOCUMENT_PART, b"<w:document xmlns:w=\"urn:w\"/>".to_vec());
        assert!(Document::from_package(pkg).is_err());
    }
}
