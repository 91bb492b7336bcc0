//! 运行配置
//!
//! 由配置层一次性构建，运行期间不可变。字段顺序与持久化文件一致：
//! 标量字段在前，嵌套表在后（TOML 要求）。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::infrastructure::RunFont;
use crate::models::cell_spec::CellSpec;
use crate::models::specimen::{specimen_id, SpecimenRange};

/// 取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// 第一个非空单元格
    #[default]
    Single,
    /// 所有数值单元格的平均值
    Average,
}

/// 报告模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// 每个试坑一份文档
    #[default]
    Individual,
    /// 所有试坑汇总到一份文档
    Consolidated,
}

/// 汇总模式下表头与试坑标识的匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatch {
    /// 互为子串即匹配（"Resultado C-01 (kg)" 匹配 "C-01"）
    #[default]
    Loose,
    /// 表头中必须有与标识完全相同的独立词
    ExactToken,
}

/// Excel → Word 表格列映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMapping {
    /// Word 表格的列标题（汇总模式下为行标题）
    pub target_label: String,
    pub sheet_name: String,
    pub cell_spec: String,
    #[serde(default)]
    pub aggregation: Aggregation,
}

/// 文本替换规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReplacement {
    pub original: String,
    pub replacement: String,
}

/// 图片位置规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePositionRule {
    /// 文档中第几张图片（从 1 开始）
    pub document_position: usize,
    /// 子目录排序后第几张图片（从 1 开始）
    pub source_index: usize,
}

/// 数值格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericFormatPolicy {
    pub fixed_decimals: bool,
    pub decimal_count: u32,
}

impl Default for NumericFormatPolicy {
    fn default() -> Self {
        Self {
            fixed_decimals: true,
            decimal_count: 1,
        }
    }
}

/// 字体配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub paragraph_font: String,
    pub paragraph_size: f64,
    pub table_font: String,
    pub table_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            paragraph_font: "Calibri".to_string(),
            paragraph_size: 11.0,
            table_font: "Calibri".to_string(),
            table_size: 11.0,
        }
    }
}

impl FontConfig {
    pub fn paragraph(&self) -> RunFont {
        RunFont {
            name: self.paragraph_font.clone(),
            size_pt: self.paragraph_size,
        }
    }

    pub fn table(&self) -> RunFont {
        RunFont {
            name: self.table_font.clone(),
            size_pt: self.table_size,
        }
    }
}

/// 输出文件命名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNaming {
    pub base_name: String,
    /// 自动追加两位编号；否则使用 `custom_suffix`
    pub auto_suffix: bool,
    pub custom_suffix: String,
}

impl Default for OutputNaming {
    fn default() -> Self {
        Self {
            base_name: "EMS CUSCO C-".to_string(),
            auto_suffix: true,
            custom_suffix: String::new(),
        }
    }
}

impl OutputNaming {
    /// 生成不带扩展名的文件名
    pub fn file_stem(&self, number: u32) -> String {
        if self.auto_suffix {
            format!("{}{:02}", self.base_name, number)
        } else {
            format!("{}{}", self.base_name, self.custom_suffix)
        }
    }
}

/// 运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfiguration {
    pub template_path: PathBuf,
    /// 候选 Excel 目录，按顺序查找
    pub workbook_folders: Vec<PathBuf>,
    pub output_folder: PathBuf,
    pub image_root: Option<PathBuf>,
    pub image_mapping_enabled: bool,
    /// 固定图片高度（厘米），0 表示使用原始尺寸
    pub fixed_image_height_cm: f64,
    pub specimen_prefix: String,
    /// 模板中的示例试坑标识，单独报告模式下替换为当前试坑
    pub template_marker: String,
    pub report_mode: ReportMode,
    pub consolidated_name: String,
    pub consolidated_match: ColumnMatch,
    pub range: SpecimenRange,
    pub naming: OutputNaming,
    pub number_format: NumericFormatPolicy,
    pub fonts: FontConfig,
    pub mappings: Vec<CellMapping>,
    pub text_replacements: Vec<TextReplacement>,
    pub image_rules: Vec<ImagePositionRule>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            template_path: PathBuf::new(),
            workbook_folders: Vec::new(),
            output_folder: PathBuf::new(),
            image_root: None,
            image_mapping_enabled: false,
            fixed_image_height_cm: 5.0,
            specimen_prefix: "C-".to_string(),
            template_marker: "C-01".to_string(),
            report_mode: ReportMode::Individual,
            consolidated_name: "Informe_Consolidado".to_string(),
            consolidated_match: ColumnMatch::Loose,
            range: SpecimenRange::default(),
            naming: OutputNaming::default(),
            number_format: NumericFormatPolicy::default(),
            fonts: FontConfig::default(),
            mappings: Vec::new(),
            text_replacements: Vec::new(),
            image_rules: Vec::new(),
        }
    }
}

impl RunConfiguration {
    pub fn specimen_id(&self, number: u32) -> String {
        specimen_id(&self.specimen_prefix, number)
    }

    /// 插入图片时使用的固定高度；为 0 时按原始尺寸插入
    pub fn fixed_image_height(&self) -> Option<f64> {
        (self.fixed_image_height_cm.is_finite() && self.fixed_image_height_cm > 0.0)
            .then_some(self.fixed_image_height_cm)
    }

    /// 单独报告的文件名（不含扩展名）
    pub fn generate_file_name(&self, number: u32) -> String {
        self.naming.file_stem(number)
    }

    /// 单独报告的输出路径
    pub fn individual_output_path(&self, number: u32) -> PathBuf {
        self.output_folder
            .join(format!("{}.docx", self.generate_file_name(number)))
    }

    /// 汇总报告的输出路径
    pub fn consolidated_output_path(&self) -> PathBuf {
        let name = if self.consolidated_name.trim().is_empty() {
            "Informe_Consolidado"
        } else {
            self.consolidated_name.trim()
        };
        self.output_folder.join(format!("{name}.docx"))
    }

    /// 检查配置，返回所有问题（为空表示可以运行）
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !is_existing_file(&self.template_path) {
            problems.push(format!(
                "- 模板文档不存在: {}",
                self.template_path.display()
            ));
        }
        if self
            .workbook_folders
            .iter()
            .all(|f| f.as_os_str().is_empty())
        {
            problems.push("- 至少需要一个 Excel 目录".to_string());
        }
        if !self.output_folder.is_dir() {
            problems.push(format!(
                "- 输出目录不存在: {}",
                self.output_folder.display()
            ));
        }
        if self.mappings.is_empty() {
            problems.push("- 至少需要一个 Excel ↔ Word 映射".to_string());
        }
        if !self.range.is_valid() {
            problems.push(format!(
                "- 编号范围无效: {}..{}",
                self.range.start, self.range.end
            ));
        }
        for mapping in &self.mappings {
            if !CellSpec::validate(&mapping.cell_spec) {
                problems.push(format!(
                    "- 映射 '{}' 的单元格引用无效: {}",
                    mapping.target_label, mapping.cell_spec
                ));
            }
        }
        if !self.fixed_image_height_cm.is_finite() || self.fixed_image_height_cm < 0.0 {
            problems.push(format!(
                "- 图片高度无效: {} (0 表示原始尺寸)",
                self.fixed_image_height_cm
            ));
        }
        for rule in &self.image_rules {
            if rule.document_position == 0 || rule.source_index == 0 {
                problems.push(format!(
                    "- 图片规则的位置从 1 开始: 文档位置 {}, 子目录序号 {}",
                    rule.document_position, rule.source_index
                ));
            }
        }
        problems
    }

    // ========== 列表编辑 ==========

    /// 添加映射（检查单元格引用）
    pub fn add_mapping(&mut self, mapping: CellMapping) -> AppResult<()> {
        CellSpec::parse(&mapping.cell_spec)?;
        self.mappings.push(mapping);
        Ok(())
    }

    /// 替换指定位置的映射；下标越界返回 `false`
    pub fn replace_mapping(&mut self, index: usize, mapping: CellMapping) -> AppResult<bool> {
        CellSpec::parse(&mapping.cell_spec)?;
        match self.mappings.get_mut(index) {
            Some(slot) => {
                *slot = mapping;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_mapping(&mut self, index: usize) -> Option<CellMapping> {
        (index < self.mappings.len()).then(|| self.mappings.remove(index))
    }

    /// 添加文本替换；原文为空时拒绝
    pub fn add_replacement(&mut self, original: &str, replacement: &str) -> bool {
        if original.is_empty() {
            return false;
        }
        self.text_replacements.push(TextReplacement {
            original: original.to_string(),
            replacement: replacement.to_string(),
        });
        true
    }

    pub fn remove_replacement(&mut self, index: usize) -> Option<TextReplacement> {
        (index < self.text_replacements.len()).then(|| self.text_replacements.remove(index))
    }

    pub fn add_image_rule(&mut self, rule: ImagePositionRule) -> AppResult<()> {
        if rule.document_position == 0 || rule.source_index == 0 {
            return Err(AppError::Config(crate::error::ConfigError::Invalid {
                problems: vec!["图片规则的位置从 1 开始".to_string()],
            }));
        }
        self.image_rules.push(rule);
        Ok(())
    }

    pub fn remove_image_rule(&mut self, index: usize) -> Option<ImagePositionRule> {
        (index < self.image_rules.len()).then(|| self.image_rules.remove(index))
    }
}

fn is_existing_file(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_file()
}
