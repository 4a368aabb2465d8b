use thiserror::Error;

/// Failures surfaced by style resolution.
///
/// Declaration-level anomalies (malformed fragments, unknown colors,
/// unparseable dimensions) degrade silently and never reach this type; an
/// error here means the input is structurally wrong and the output would be
/// a silently incorrect spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// A string that should carry a pixel count contains no digits.
    /// Raised by solid border edges without a usable width and by the table
    /// `border` attribute; the border-shorthand expansion is the only caller
    /// that tolerates it (the token is reinterpreted as a style keyword).
    #[error("no integer value found in {value:?}")]
    MissingInteger { value: String },
}
