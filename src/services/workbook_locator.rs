//! 工作簿定位
//!
//! 在候选目录中按顺序查找 `<试坑标识>.xlsx`

use std::path::{Path, PathBuf};

use crate::error::{AppResult, WorkbookError};

/// 返回第一个存在的工作簿路径
pub fn locate_workbook(folders: &[PathBuf], specimen_id: &str) -> AppResult<PathBuf> {
    let file_name = format!("{specimen_id}.xlsx");
    folders
        .iter()
        .filter(|f| !f.as_os_str().is_empty())
        .map(|f| f.join(&file_name))
        .find(|p| Path::is_file(p))
        .ok_or_else(|| {
            WorkbookError::WorkbookNotFound {
                specimen_id: specimen_id.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn first_folder_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join("C-01.xlsx"), b"").unwrap();
        std::fs::write(b.path().join("C-02.xlsx"), b"").unwrap();
        std::fs::write(a.path().join("C-02.xlsx"), b"").unwrap();
        let folders = vec![a.path().to_path_buf(), b.path().to_path_buf()];

        assert_eq!(
            locate_workbook(&folders, "C-01").unwrap(),
            b.path().join("C-01.xlsx")
        );
        assert_eq!(
            locate_workbook(&folders, "C-02").unwrap(),
            a.path().join("C-02.xlsx")
        );
        assert!(matches!(
            locate_workbook(&folders, "C-03"),
            Err(AppError::Workbook(WorkbookError::WorkbookNotFound { .. }))
        ));
    }
}
