pub mod cell_resolver;
pub mod font_format;
pub mod image_folder;
pub mod image_service;
pub mod log_writer;
pub mod number_format;
pub mod table_injector;
pub mod text_substitution;
pub mod workbook_locator;

pub use cell_resolver::WorkbookReader;
pub use image_service::ImagePassReport;
pub use log_writer::LogWriter;
pub use number_format::NumberFormatter;
pub use table_injector::{ConsolidatedData, InjectOutcome};
pub use workbook_locator::locate_workbook;
