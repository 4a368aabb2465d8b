pub mod cascade;
pub mod classify;
pub mod css;
pub mod error;
pub mod richtext;
pub mod style;
pub mod table;

pub use cascade::CascadeStore;
pub use classify::CellType;
pub use error::StyleError;
pub use richtext::TextRun;
pub use style::{ComputedStyle, Side, StyleCache};
pub use table::{Table, TableCell, TableRow, TableSection};
