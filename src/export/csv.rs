use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::Exporter;
use crate::error::{ExportError, Result};
use crate::models::{ExportFormat, ExportGrid};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Writes every field quoted, inner quotes doubled, rows separated by `\n`.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    delimiter: u8,
    with_bom: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: b',',
            with_bom: false,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Prefix the output with a UTF-8 BOM for Excel.
    pub fn with_bom(mut self, with_bom: bool) -> Self {
        self.with_bom = with_bom;
        self
    }

    pub fn to_csv_string(&self, grid: &ExportGrid) -> Result<String> {
        let bytes = self.export(grid)?;
        String::from_utf8(bytes).map_err(|e| ExportError::serialization(ExportFormat::Csv, e))
    }
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn export(&self, grid: &ExportGrid) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if self.with_bom {
            out.extend_from_slice(UTF8_BOM);
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);

        for line in grid.lines() {
            writer.write_record(line)?;
        }

        let mut out = writer
            .into_inner()
            .map_err(|e| ExportError::serialization(ExportFormat::Csv, e.to_string()))?;

        // Rows are joined, not terminated
        if out.last() == Some(&b'\n') {
            out.pop();
        }

        Ok(out)
    }
}

/// Comma-separated, no BOM.
pub fn to_csv(grid: &ExportGrid) -> Result<String> {
    CsvExporter::new().to_csv_string(grid)
}
