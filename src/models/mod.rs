pub mod cell;
pub mod grid;
pub mod request;

pub use cell::normalize;
pub use grid::{build_grid, Column, ExportGrid, Row};
pub use request::{ExportFormat, ExportRequest, ExportResult, SelectionContext};
