//! Workbook input.

pub mod reader;

pub use reader::{read_bytes, read_path, LoadedSheet};
