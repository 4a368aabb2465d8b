use rust_xlsxwriter::XlsxError;
use tablecast_engine::StyleError;
use thiserror::Error;

/// Failures while planning or writing a worksheet.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error("spreadsheet write failed: {0}")]
    Xlsx(#[from] XlsxError),
}
