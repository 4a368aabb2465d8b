pub mod error;
pub mod plan;
pub mod xlsx;

pub use error::WriteError;
pub use plan::{plan_table, MergeRegion, SheetPlan};
pub use xlsx::{document_to_workbook, document_to_xlsx, ConvertReport};
