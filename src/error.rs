use thiserror::Error;

use crate::models::ExportFormat;

pub type Result<T, E = ExportError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No records to export")]
    NoData,

    #[error("Missing selection: {0}")]
    MissingSelection(String),

    #[error("Failed to write {format} output: {source}")]
    Serialization {
        format: ExportFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot parsing error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ExportError {
    pub fn serialization<E>(format: ExportFormat, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Serialization {
            format,
            source: source.into(),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::serialization(ExportFormat::Csv, err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::serialization(ExportFormat::Xlsx, err)
    }
}
