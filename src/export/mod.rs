pub mod csv;
pub mod excel;
pub mod filename;

use chrono::NaiveDate;

use crate::error::{ExportError, Result};
use crate::models::{build_grid, Column, ExportFormat, ExportGrid, ExportRequest, ExportResult, Row};

pub use self::csv::{to_csv, CsvExporter};
pub use self::excel::{sanitize_sheet_name, to_xlsx, ExcelExporter};
pub use self::filename::{default_base, resolve_filename};

/// Serializes a grid into one output format.
pub trait Exporter {
    fn format(&self) -> ExportFormat;

    fn export(&self, grid: &ExportGrid) -> Result<Vec<u8>>;
}

/// Columns and rows in, named byte payload out.
///
/// Holds only serializer settings; nothing carries over between calls.
#[derive(Debug, Clone, Default)]
pub struct TabularExporter {
    csv: CsvExporter,
    excel: ExcelExporter,
}

impl TabularExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv(mut self, csv: CsvExporter) -> Self {
        self.csv = csv;
        self
    }

    /// The sheet name configured here is replaced per request.
    pub fn with_excel(mut self, excel: ExcelExporter) -> Self {
        self.excel = excel;
        self
    }

    /// Exports dated with today's local date.
    pub fn export<I, R>(&self, columns: &[Column], rows: I, request: &ExportRequest) -> Result<ExportResult>
    where
        I: IntoIterator<Item = R>,
        R: Row,
    {
        self.export_on(columns, rows, request, chrono::Local::now().date_naive())
    }

    pub fn export_on<I, R>(
        &self,
        columns: &[Column],
        rows: I,
        request: &ExportRequest,
        date: NaiveDate,
    ) -> Result<ExportResult>
    where
        I: IntoIterator<Item = R>,
        R: Row,
    {
        if columns.is_empty() {
            return Err(ExportError::MissingSelection("no columns to export".to_string()));
        }

        let grid = build_grid(columns, rows);
        if request.require_records && grid.is_empty() {
            return Err(ExportError::NoData);
        }

        self.export_grid(&grid, request, date)
    }

    pub fn export_grid(&self, grid: &ExportGrid, request: &ExportRequest, date: NaiveDate) -> Result<ExportResult> {
        let bytes = match request.format {
            ExportFormat::Csv => self.csv.export(grid)?,
            ExportFormat::Xlsx => self
                .excel
                .clone()
                .with_sheet_name(&self.sheet_name_for(request))
                .export(grid)?,
        };

        let base = default_base(request.context.as_ref(), date);
        let suggested_filename = resolve_filename(request.filename.as_deref(), &base, request.format);

        Ok(ExportResult {
            bytes,
            suggested_filename,
            mime_type: request.format.mime_type(),
            record_count: grid.record_count(),
        })
    }

    fn sheet_name_for(&self, request: &ExportRequest) -> String {
        request
            .sheet_name
            .as_deref()
            .or(request.context.as_ref().map(|ctx| ctx.view_name.as_str()))
            .map(sanitize_sheet_name)
            .unwrap_or_else(|| excel::DEFAULT_SHEET_NAME.to_string())
    }
}
