//! # vt-data
//!
//! Dataset ingestion for the Vintry pipeline: loading the semicolon-separated
//! wine quality file, correcting the known mislabeled quality value, encoding
//! quality categories to integer codes, and producing the seeded train/test
//! partition.
//!
//! Every malformed input is fatal. A file that cannot be opened, a row with
//! the wrong column count, or a feature value that does not parse aborts the
//! load with a detailed error rather than skipping the row.

pub mod encode;
pub mod loader;
pub mod split;

pub use encode::*;
pub use loader::*;
pub use split::*;
