//! 图片目录解析
//!
//! 根据试坑编号选择图片根目录下的子目录，并给出子目录中图片的固定顺序。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;
use tracing::debug;

use crate::error::{AppResult, ImageError};
use crate::infrastructure::docx::drawing::extension_of;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("number pattern is valid"))
}

/// 修改时间（读取失败时视为最早）
fn modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// 按修改时间升序，同一时间按文件名排序
fn sort_by_mtime(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| (modified(p), p.file_name().map(|n| n.to_os_string())));
}

/// 名称中是否有一段数字等于编号（"01"、"C-01"、"Imágenes 1" 都对应 1）
pub fn name_has_number(name: &str, number: u32) -> bool {
    number_pattern()
        .find_iter(name)
        .any(|m| m.as_str().parse::<u64>().ok() == Some(number as u64))
}

fn subdirectories(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// 选择试坑对应的图片子目录
///
/// 先按名称中的数字匹配；没有匹配时按修改时间排序，取第 `number` 个。
pub fn resolve_specimen_folder(root: &Path, number: u32) -> AppResult<PathBuf> {
    let not_found = || ImageError::FolderNotFound {
        root: root.display().to_string(),
        specimen_number: number,
    };
    let mut dirs = subdirectories(root).map_err(|_| not_found())?;

    let by_name = dirs.iter().find(|d| {
        d.file_name()
            .map(|n| name_has_number(&n.to_string_lossy(), number))
            .unwrap_or(false)
    });
    if let Some(dir) = by_name {
        debug!("编号 {} 匹配子目录 {}", number, dir.display());
        return Ok(dir.clone());
    }

    sort_by_mtime(&mut dirs);
    let index = (number as usize).checked_sub(1).ok_or_else(not_found)?;
    let dir = dirs.get(index).cloned().ok_or_else(not_found)?;
    debug!("编号 {} 按修改时间选择子目录 {}", number, dir.display());
    Ok(dir)
}

/// 子目录中的图片，按修改时间升序
pub fn ordered_images(folder: &Path) -> AppResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|_| ImageError::FolderNotFound {
        root: folder.display().to_string(),
        specimen_number: 0,
    })?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(extension_of)
                .is_some()
        })
        .collect();
    sort_by_mtime(&mut images);
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, secs: u64) {
        let file = File::create(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn numeric_runs() {
        assert!(name_has_number("C-01", 1));
        assert!(name_has_number("Imágenes 12 final", 12));
        assert!(!name_has_number("C-10", 1));
        assert!(!name_has_number("fotos", 1));
    }

    #[test]
    fn folder_by_name_then_mtime() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Calicata 02")).unwrap();
        fs::create_dir(root.path().join("zeta")).unwrap();
        fs::create_dir(root.path().join("alfa")).unwrap();

        let found = resolve_specimen_folder(root.path(), 2).unwrap();
        assert!(found.ends_with("Calicata 02"));

        // 名称中没有编号 1，按修改时间取第一个
        let dir = |n: &str| root.path().join(n);
        File::open(dir("zeta"))
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(10))
            .unwrap();
        File::open(dir("alfa"))
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(20))
            .unwrap();
        File::open(dir("Calicata 02"))
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(30))
            .unwrap();
        assert!(resolve_specimen_folder(root.path(), 1)
            .unwrap()
            .ends_with("zeta"));
        assert!(matches!(
            resolve_specimen_folder(root.path(), 7),
            Err(crate::error::AppError::Image(ImageError::FolderNotFound { .. }))
        ));
    }

    #[test]
    fn images_sorted_by_mtime() {
        let folder = tempfile::tempdir().unwrap();
        touch(&folder.path().join("b.png"), 100);
        touch(&folder.path().join("a.JPG"), 200);
        touch(&folder.path().join("c.png"), 100);
        touch(&folder.path().join("notas.txt"), 50);

        let names: Vec<String> = ordered_images(folder.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["b.png", "c.png", "a.JPG"]);
    }
}
