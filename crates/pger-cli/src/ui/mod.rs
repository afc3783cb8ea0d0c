//! Terminal output for pger commands.
//!
//! - [`theme`] - colors, icons and column widths
//! - [`output`] - the console [`Output`] handle, also the pipeline's reporter
//! - [`list`] - column-aligned rows for index and ledger listings

pub mod list;
pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
