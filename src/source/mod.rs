pub mod tables;
pub mod workbook;

pub use tables::load_tables;
pub use workbook::{SheetSpec, SheetTable, SourceWorkbook, REQUIRED_SHEETS};
