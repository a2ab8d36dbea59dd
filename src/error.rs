//! Error taxonomy for a DRE run.
//!
//! Every variant is terminal for the current run: nothing is retried and no
//! partial report is written. Numeric coercion problems never show up here.

use crate::analysis::LogicalField;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DreError {
    #[error("failed to read spreadsheet '{file}': {message}")]
    Read { file: String, message: String },

    #[error("unsupported file type '.{extension}' for '{file}' (expected one of: {expected})")]
    UnsupportedFormat {
        file: String,
        extension: String,
        expected: String,
    },

    #[error("required column '{field}' was not found in the spreadsheet (accepted headers: {aliases})")]
    MissingColumn {
        field: LogicalField,
        aliases: String,
    },

    #[error("failed to write report to '{path}': {message}")]
    Write { path: String, message: String },
}

impl DreError {
    pub fn read(file: impl Into<String>, message: impl ToString) -> Self {
        Self::Read {
            file: file.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Write {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
