//! Binding to the host application's data model: base snapshots, record
//! queries, active table/view selection and the export session.

pub mod base;
pub mod selection;
pub mod session;

pub use base::{Base, Cursor, Field, Record, RecordQuery, RecordRow, Table, View};
pub use selection::{ActiveSelectionProvider, CursorTracking, FirstAvailable, Manual, Selection, SelectionMode};
pub use session::export_view;
