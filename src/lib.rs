//! View Export - table/view data to CSV and Excel workbooks
//!
//! Columns and rows read from a host database view are normalized into a
//! grid (header plus string cells) and serialized to CSV text or a
//! single-sheet `.xlsx` buffer together with a suggested filename.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use view_export::export::TabularExporter;
//! use view_export::models::{Column, ExportFormat, ExportRequest};
//!
//! let columns = Column::from_names(["Name", "Tags"]);
//! let rows = vec![vec![json!("Alice"), json!([{"name": "VIP"}])]];
//!
//! let result = TabularExporter::new().export(&columns, &rows, &ExportRequest::new(ExportFormat::Csv))?;
//! println!("{} ({} records)", result.suggested_filename, result.record_count);
//! # Ok::<(), view_export::ExportError>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod models;

pub use error::{ExportError, Result};
pub use export::{Exporter, TabularExporter};
pub use models::{Column, ExportFormat, ExportGrid, ExportRequest, ExportResult, Row};
