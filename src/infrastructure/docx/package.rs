//! OOXML 包（zip 容器）读写
//!
//! 保持部件在 zip 中的原始顺序，保存时整体重新压缩。

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{AppError, AppResult};

/// 文档包
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// 从文件读取
    pub fn open(path: &Path) -> AppResult<Self> {
        let bytes =
            std::fs::read(path).map_err(|e| AppError::template_unreadable(path.display().to_string(), e))?;
        Self::from_bytes(&bytes)
            .map_err(|e| AppError::template_unreadable(path.display().to_string(), e))
    }

    /// 从内存读取
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, zip::result::ZipError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut contents)?;
            parts.push((file.name().to_string(), contents));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    /// 读取部件为 UTF-8 文本
    pub fn part_text(&self, name: &str) -> AppResult<Option<String>> {
        match self.part(name) {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| AppError::malformed_xml(name, e)),
            None => Ok(None),
        }
    }

    /// 写入部件（已存在则覆盖，否则追加）
    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.parts.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name, data)),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// 压缩为 zip 字节
    pub fn to_bytes(&self) -> Result<Vec<u8>, zip::result::ZipError> {
        let mut output = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut output));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, data) in &self.parts {
                writer.start_file(name.as_str(), options)?;
                writer.write_all(data)?;
            }
            writer.finish()?;
        }
        Ok(output)
    }

    /// 保存到文件
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let bytes = self
            .to_bytes()
            .map_err(|e| AppError::output_write_failed(path.display().to_string(), e))?;
        let mut file = File::create(path)
            .map_err(|e| AppError::output_write_failed(path.display().to_string(), e))?;
        file.write_all(&bytes)
            .map_err(|e| AppError::output_write_failed(path.display().to_string(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_survive_a_zip_roundtrip_in_order() {
        let mut pkg = DocxPackage::default();
        pkg.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        pkg.set_part("word/document.xml", b"<w:document/>".to_vec());
        pkg.set_part("word/media/image1.png", vec![1, 2, 3]);
        pkg.set_part("word/document.xml", b"<w:document>x</w:document>".to_vec());

        let bytes = pkg.to_bytes().unwrap();
        let reopened = DocxPackage::from_bytes(&bytes).unwrap();
        let names: Vec<_> = reopened.part_names().collect();
        assert_eq!(
            names,
            ["[Content_Types].xml", "word/document.xml", "word/media/image1.png"]
        );
        assert_eq!(
            reopened.part_text("word/document.xml").unwrap().as_deref(),
            Some("<w:document>x</w:document>")
        );
        assert_eq!(reopened.part("word/media/image1.png"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn garbage_is_not_a_package() {
        assert!(DocxPackage::from_bytes(b"definitely not a zip").is_err());
    }
}
