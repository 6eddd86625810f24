//! Record decoding.
//!
//! Decoding is two-staged: [`csv`] turns source files into rows of raw text
//! fields, and [`nested`] interprets the JSON-encoded sub-documents embedded in
//! those fields. Each stage fails independently so a bad sub-field never takes
//! the surrounding row down with it.

pub mod csv;
pub mod nested;
pub mod scalar;

pub use self::csv::{open_reader, read_rows, RowOutcome};
pub use nested::{decode_list, decode_optional, NestedError};
