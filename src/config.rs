use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::{CsvExporter, ExcelExporter, TabularExporter};
use crate::host::SelectionMode;
use crate::models::ExportFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_format: ExportFormat,
    pub selection_mode: SelectionMode,
    /// Fall back to the first table when the cursor has no active table.
    pub fallback_to_first: bool,
    pub allow_empty_export: bool,
    pub output_dir: Option<String>,
    pub csv: CsvOptions,
    pub excel: ExcelOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: char,
    pub with_bom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelOptions {
    pub bold_header: bool,
    pub header_fill: bool,
    pub autofit_columns: bool,
    pub freeze_header: bool,
    pub autofilter: bool,
    pub cell_borders: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Xlsx,
            selection_mode: SelectionMode::Cursor,
            fallback_to_first: true,
            allow_empty_export: true,
            output_dir: None,
            csv: CsvOptions::default(),
            excel: ExcelOptions::default(),
        }
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            with_bom: false,
        }
    }
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            bold_header: true,
            header_fill: true,
            autofit_columns: true,
            freeze_header: true,
            autofilter: false,
            cell_borders: true,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`, or defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "view-export", "view-export")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(proj_dirs.config_dir().join("config.json"))
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.csv.delimiter.is_ascii() {
            errors.push("CSV delimiter must be an ASCII character".to_string());
        }

        if matches!(self.csv.delimiter, '"' | '\n' | '\r') {
            errors.push("CSV delimiter cannot be a quote or line break".to_string());
        }

        if let Some(dir) = &self.output_dir {
            if dir.trim().is_empty() {
                errors.push("Output directory cannot be blank".to_string());
            }
        }

        errors
    }

    /// Exporter carrying these serializer settings.
    pub fn exporter(&self) -> Result<TabularExporter> {
        let delimiter = u8::try_from(self.csv.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                anyhow::anyhow!("CSV delimiter {:?} is not an ASCII character", self.csv.delimiter)
            })?;

        let csv = CsvExporter::new()
            .with_delimiter(delimiter)
            .with_bom(self.csv.with_bom);

        let excel = ExcelExporter::new()
            .with_bold_header(self.excel.bold_header)
            .with_header_fill(self.excel.header_fill)
            .with_autofit_columns(self.excel.autofit_columns)
            .with_freeze_header(self.excel.freeze_header)
            .with_autofilter(self.excel.autofilter)
            .with_cell_borders(self.excel.cell_borders);

        Ok(TabularExporter::new().with_csv(csv).with_excel(excel))
    }
}
