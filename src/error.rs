use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// Excel 工作簿相关错误
    #[error("工作簿错误: {0}")]
    Workbook(#[from] WorkbookError),
    /// 图片相关错误
    #[error("图片错误: {0}")]
    Image(#[from] ImageError),
    /// Word 文档相关错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 工作簿错误
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// 单元格引用格式无效
    #[error("单元格引用无效 '{spec}': {reason}")]
    InvalidCellSpec { spec: String, reason: String },
    /// 工作表不存在（区分大小写）
    #[error("工作簿 {workbook} 中没有工作表 '{sheet}'")]
    SheetNotFound { sheet: String, workbook: String },
    /// 文件不存在或无法解析为表格
    #[error("无法读取工作簿 {path}: {source}")]
    WorkbookUnreadable {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 候选目录中都找不到该试坑的工作簿
    #[error("找不到 {specimen_id} 的 Excel 文件")]
    WorkbookNotFound { specimen_id: String },
}

/// 图片错误
#[derive(Debug, Error)]
pub enum ImageError {
    /// 图片文件不存在
    #[error("图片不存在: {path}")]
    ImageNotFound { path: String },
    /// 插入图片失败（已尝试不带固定高度重试）
    #[error("无法插入图片 {path}: {reason}")]
    ImageInsertFailed { path: String, reason: String },
    /// 找不到试坑对应的图片子目录
    #[error("找不到编号 {specimen_number} 对应的图片子目录 (根目录: {root})")]
    FolderNotFound { root: String, specimen_number: u32 },
}

/// 文档错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 模板无法打开或解析，整个批次中止
    #[error("模板文档无法读取 {path}: {source}")]
    CriticalTemplateError {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// XML 结构错误
    #[error("XML 解析失败 ({part}): {reason}")]
    MalformedXml { part: String, reason: String },
    /// 文档包中缺少必须的部件
    #[error("文档包缺少部件: {part}")]
    MissingPart { part: String },
    /// 写入输出文件失败，整个批次中止
    #[error("写入输出文件失败 {path}: {source}")]
    OutputWriteFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 配置文件格式错误
    #[error("配置文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 写入配置文件失败
    #[error("写入配置文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 配置内容不合法
    #[error("配置不合法:\n{}", .problems.join("\n"))]
    Invalid { problems: Vec<String> },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建单元格引用无效错误
    pub fn invalid_cell_spec(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Workbook(WorkbookError::InvalidCellSpec {
            spec: spec.into(),
            reason: reason.into(),
        })
    }

    /// 创建工作簿无法读取错误
    pub fn workbook_unreadable(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Workbook(WorkbookError::WorkbookUnreadable {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建模板读取错误
    pub fn template_unreadable(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Document(DocumentError::CriticalTemplateError {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建输出写入错误
    pub fn output_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Document(DocumentError::OutputWriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 XML 解析错误
    pub fn malformed_xml(part: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Document(DocumentError::MalformedXml {
            part: part.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建图片插入失败错误
    pub fn image_insert_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Image(ImageError::ImageInsertFailed {
            path: path.into(),
            reason: reason.to_string(),
        })
    }

    /// 是否为需要中止整个批次的错误
    ///
    /// 模板无法读取、输出无法写入属于致命错误；其余错误只影响单个映射/图片/试坑。
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Document(DocumentError::CriticalTemplateError { .. })
                | AppError::Document(DocumentError::OutputWriteFailed { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
