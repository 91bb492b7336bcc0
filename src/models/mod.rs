pub mod cell_spec;
pub mod cell_value;
pub mod loaders;
pub mod run_config;
pub mod specimen;

pub use cell_spec::{CellRef, CellSpec, CellToken};
pub use cell_value::CellValue;
pub use loaders::{load_run_config, save_run_config};
pub use run_config::{
    Aggregation, CellMapping, ColumnMatch, FontConfig, ImagePositionRule, NumericFormatPolicy,
    OutputNaming, ReportMode, RunConfiguration, TextReplacement,
};
pub use specimen::{specimen_id, SpecimenRange};
