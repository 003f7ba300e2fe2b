use regex::Regex;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};
use std::sync::LazyLock;

use super::Exporter;
use crate::error::{ExportError, Result};
use crate::models::{ExportFormat, ExportGrid};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
const MAX_SHEET_NAME_CHARS: usize = 31;
const MAX_COLUMN_WIDTH: usize = 50;
const COLUMN_PADDING: usize = 2;
const HEADER_FILL: u32 = 0xE6E6FA;

static ILLEGAL_SHEET_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\\/?*\[\]]").expect("sheet name pattern is valid"));

/// Excel reserves this name for its change-tracking sheet.
const RESERVED_SHEET_NAME: &str = "history";

/// Makes `name` usable as a worksheet name, falling back to `Sheet1`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced = ILLEGAL_SHEET_CHARS.replace_all(name, " ");
    let truncated: String = replaced.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let trimmed = truncated.trim().trim_matches('\'').trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(RESERVED_SHEET_NAME) {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Column width heuristic: longest cell plus padding, capped.
pub fn column_width(max_chars: usize) -> usize {
    (max_chars + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
}

/// Single-sheet workbook writer. Every cell is written as text.
#[derive(Debug, Clone)]
pub struct ExcelExporter {
    sheet_name: String,
    bold_header: bool,
    header_fill: bool,
    autofit_columns: bool,
    freeze_header: bool,
    autofilter: bool,
    cell_borders: bool,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            bold_header: true,
            header_fill: true,
            autofit_columns: true,
            freeze_header: true,
            autofilter: false,
            cell_borders: true,
        }
    }
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet_name(mut self, sheet_name: &str) -> Self {
        self.sheet_name = sanitize_sheet_name(sheet_name);
        self
    }

    pub fn with_bold_header(mut self, bold: bool) -> Self {
        self.bold_header = bold;
        self
    }

    pub fn with_header_fill(mut self, fill: bool) -> Self {
        self.header_fill = fill;
        self
    }

    pub fn with_autofit_columns(mut self, autofit: bool) -> Self {
        self.autofit_columns = autofit;
        self
    }

    pub fn with_freeze_header(mut self, freeze: bool) -> Self {
        self.freeze_header = freeze;
        self
    }

    pub fn with_autofilter(mut self, autofilter: bool) -> Self {
        self.autofilter = autofilter;
        self
    }

    /// Thin borders around every header and data cell.
    pub fn with_cell_borders(mut self, borders: bool) -> Self {
        self.cell_borders = borders;
        self
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn header_format(&self) -> Format {
        let mut format = Format::new();
        if self.bold_header {
            format = format.set_bold();
        }
        if self.header_fill {
            format = format.set_background_color(Color::RGB(HEADER_FILL));
        }
        if self.cell_borders {
            format = format.set_border(FormatBorder::Thin);
        }
        format
    }

    fn cell_format(&self) -> Option<Format> {
        self.cell_borders.then(|| Format::new().set_border(FormatBorder::Thin))
    }

    fn write_sheet(&self, worksheet: &mut Worksheet, grid: &ExportGrid) -> Result<()> {
        worksheet.set_name(&self.sheet_name)?;

        let header_format = self.header_format();
        for (col, name) in grid.header.iter().enumerate() {
            let col = col_num(col)?;
            if name.is_empty() {
                worksheet.write_blank(0, col, &header_format)?;
            } else {
                worksheet.write_string_with_format(0, col, name, &header_format)?;
            }
        }

        let cell_format = self.cell_format();
        for (idx, cells) in grid.rows.iter().enumerate() {
            let row = row_num(idx + 1)?;
            for (col, value) in cells.iter().enumerate() {
                let col = col_num(col)?;
                match (&cell_format, value.is_empty()) {
                    (Some(format), true) => {
                        worksheet.write_blank(row, col, format)?;
                    }
                    (Some(format), false) => {
                        worksheet.write_string_with_format(row, col, value, format)?;
                    }
                    (None, true) => {}
                    (None, false) => {
                        worksheet.write_string(row, col, value)?;
                    }
                }
            }
        }

        if self.autofit_columns {
            for (col, max_chars) in grid.column_char_widths().into_iter().enumerate() {
                worksheet.set_column_width(col_num(col)?, column_width(max_chars) as f64)?;
            }
        }

        if self.freeze_header {
            worksheet.set_freeze_panes(1, 0)?;
        }

        if self.autofilter && !grid.header.is_empty() {
            let last_col = col_num(grid.column_count() - 1)?;
            worksheet.autofilter(0, 0, row_num(grid.record_count())?, last_col)?;
        }

        Ok(())
    }
}

impl Exporter for ExcelExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn export(&self, grid: &ExportGrid) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        self.write_sheet(worksheet, grid)?;

        Ok(workbook.save_to_buffer()?)
    }
}

/// Writes `grid` to a workbook with a single sheet named after `sheet_name`.
pub fn to_xlsx(grid: &ExportGrid, sheet_name: &str) -> Result<Vec<u8>> {
    ExcelExporter::new().with_sheet_name(sheet_name).export(grid)
}

fn row_num(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| {
        ExportError::serialization(ExportFormat::Xlsx, format!("row {} is out of range", row))
    })
}

fn col_num(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| {
        ExportError::serialization(ExportFormat::Xlsx, format!("column {} is out of range", col))
    })
}
