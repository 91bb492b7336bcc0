pub mod document;
pub mod drawing;
pub mod package;
pub mod xml;

pub use document::{Document, ImageHandle, RunFont};
pub use drawing::PictureSize;
pub use package::DocxPackage;
pub use xml::NodePath;
