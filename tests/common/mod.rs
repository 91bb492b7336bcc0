//! 集成测试共用的测试数据构建函数
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use calicata_report::infrastructure::Document;
use calicata_report::models::{
    Aggregation, CellMapping, CellRef, RunConfiguration, SpecimenRange,
};
use calicata_report::orchestrator::{BatchEvent, EventSink, StopFlag};
use rust_xlsxwriter::Workbook;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#,
);

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// 模板中的一张图片
pub struct TemplateImage {
    pub rel_id: &'static str,
    pub target: &'static str,
    pub data: Vec<u8>,
}

/// 单元格值
pub enum Cell<'a> {
    Num(f64),
    Text(&'a str),
}

// ========== Word 模板 ==========

pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

pub fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|c| format!("<w:tc>{}</w:tc>", paragraph(c)))
                .collect();
            format!("<w:tr>{cells}</w:tr>")
        })
        .collect();
    format!("<w:tbl>{rows}</w:tbl>")
}

pub fn picture_paragraph(rel_id: &str, picture_id: u32) -> String {
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="914400" cy="914400"/><wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="original.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/></pic:blipFill><pic:spPr/></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        id = picture_id,
        rel = rel_id,
    )
}

pub fn write_template(path: &Path, body: &str) {
    write_template_with_images(path, body, &[]);
}

pub fn write_template_with_images(path: &Path, body: &str, images: &[TemplateImage]) {
    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
            r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
            r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<w:body>{body}<w:sectPr/></w:body></w:document>"#,
        ),
        body = body
    );
    let relationships: String = images
        .iter()
        .map(|img| {
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                img.rel_id, IMAGE_REL_TYPE, img.target
            )
        })
        .collect();
    let document_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
    );

    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    let mut add = |name: &str, data: &[u8]| {
        zip.start_file(name, options).unwrap();
        zip.write_all(data).unwrap();
    };
    add("[Content_Types].xml", CONTENT_TYPES.as_bytes());
    add("_rels/.rels", PACKAGE_RELS.as_bytes());
    add("word/document.xml", document.as_bytes());
    add("word/_rels/document.xml.rels", document_rels.as_bytes());
    for img in images {
        add(&format!("word/{}", img.target), &img.data);
    }
    zip.finish().unwrap();
}

// ========== Excel 工作簿 ==========

pub fn write_workbook(path: &Path, sheet_name: &str, cells: &[(&str, Cell<'_>)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    for (reference, value) in cells {
        let cell = CellRef::parse(reference).unwrap();
        let col = cell.col as u16;
        match value {
            Cell::Num(n) => sheet.write_number(cell.row, col, *n).unwrap(),
            Cell::Text(s) => sheet.write_string(cell.row, col, *s).unwrap(),
        };
    }
    workbook.save(path).unwrap();
}

// ========== 图片 ==========

pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tmp.png");
    write_png(&path, width, height);
    std::fs::read(path).unwrap()
}

// ========== 配置与结果 ==========

/// 一次运行所需的目录
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub template: PathBuf,
    pub workbooks: PathBuf,
    pub output: PathBuf,
    pub images: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let workbooks = root.path().join("excel");
        let output = root.path().join("salida");
        let images = root.path().join("imagenes");
        for dir in [&workbooks, &output, &images] {
            std::fs::create_dir(dir).unwrap();
        }
        Self {
            template: root.path().join("plantilla.docx"),
            root,
            workbooks,
            output,
            images,
        }
    }

    pub fn workbook(&self, specimen_id: &str) -> PathBuf {
        self.workbooks.join(format!("{specimen_id}.xlsx"))
    }

    pub fn config(&self, start: u32, end: u32) -> RunConfiguration {
        RunConfiguration {
            template_path: self.template.clone(),
            workbook_folders: vec![self.workbooks.clone()],
            output_folder: self.output.clone(),
            image_root: Some(self.images.clone()),
            range: SpecimenRange::new(start, end),
            ..Default::default()
        }
    }
}

pub fn mapping(label: &str, sheet: &str, spec: &str, aggregation: Aggregation) -> CellMapping {
    CellMapping {
        target_label: label.to_string(),
        sheet_name: sheet.to_string(),
        cell_spec: spec.to_string(),
        aggregation,
    }
}

/// 第一个表格中某列的所有数据行文本
pub fn column_values(document: &Document, header: &str) -> Vec<String> {
    let table = document.tables()[0].clone();
    let rows = document.table_rows(&table);
    let column = document
        .row_cells(&rows[0])
        .iter()
        .position(|c| document.cell_text(c).trim() == header)
        .unwrap();
    rows[1..]
        .iter()
        .map(|r| document.cell_text(&document.row_cells(r)[column]))
        .collect()
}

pub fn body_texts(document: &Document) -> Vec<String> {
    document
        .body_paragraphs()
        .iter()
        .map(|p| document.paragraph_text(p))
        .collect()
}

/// 记录所有事件，处理完指定数量后请求停止
pub struct RecordingSink {
    pub events: Mutex<Vec<BatchEvent>>,
    stop: Option<(StopFlag, usize)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            stop: None,
        }
    }

    pub fn stopping_after(stop: StopFlag, done: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            stop: Some((stop, done)),
        }
    }

    pub fn log_messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Log(line) => Some(line.message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BatchEvent) {
        if let (Some((stop, after)), BatchEvent::Progress { done, .. }) = (&self.stop, &event) {
            if done == after {
                stop.request_stop();
            }
        }
        self.events.lock().unwrap().push(event);
    }
}
