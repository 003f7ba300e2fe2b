use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use super::base::{Base, Table, View};
use crate::error::{ExportError, Result};
use crate::models::SelectionContext;

/// A resolved table and view.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'b> {
    pub table: &'b Table,
    pub view: &'b View,
}

impl Selection<'_> {
    pub fn context(&self) -> SelectionContext {
        SelectionContext::new(&self.table.name, &self.view.name)
    }
}

/// Decides which table and view an export reads from.
pub trait ActiveSelectionProvider {
    fn resolve<'b>(&self, base: &'b Base) -> Result<Selection<'b>>;
}

/// Table and view picked explicitly, by id or name. Never falls back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manual {
    pub table: String,
    pub view: String,
}

impl Manual {
    pub fn new(table: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            view: view.into(),
        }
    }
}

impl ActiveSelectionProvider for Manual {
    fn resolve<'b>(&self, base: &'b Base) -> Result<Selection<'b>> {
        let table = base
            .table(&self.table)
            .ok_or_else(|| ExportError::MissingSelection(format!("table '{}' not found", self.table)))?;
        let view = table.view(&self.view).ok_or_else(|| {
            ExportError::MissingSelection(format!("view '{}' not found in table '{}'", self.view, table.name))
        })?;

        Ok(Selection { table, view })
    }
}

/// Follows the host cursor's active table and view.
///
/// A missing active view resolves to the table's first view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorTracking {
    pub fallback_to_first: bool,
}

impl CursorTracking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback_to_first = fallback;
        self
    }
}

impl ActiveSelectionProvider for CursorTracking {
    fn resolve<'b>(&self, base: &'b Base) -> Result<Selection<'b>> {
        let active = base
            .cursor
            .active_table_id
            .as_deref()
            .and_then(|id| base.table_by_id(id));

        let Some(table) = active else {
            if self.fallback_to_first {
                warn!(cursor = ?base.cursor, "no active table, using first table");
                return FirstAvailable.resolve(base);
            }
            return Err(ExportError::MissingSelection("no active table".to_string()));
        };

        let view = base
            .cursor
            .active_view_id
            .as_deref()
            .and_then(|id| table.view_by_id(id))
            .or_else(|| table.views.first())
            .ok_or_else(|| ExportError::MissingSelection(format!("table '{}' has no views", table.name)))?;

        debug!(table = %table.name, view = %view.name, "resolved selection from cursor");
        Ok(Selection { table, view })
    }
}

/// First table of the base and its first view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstAvailable;

impl ActiveSelectionProvider for FirstAvailable {
    fn resolve<'b>(&self, base: &'b Base) -> Result<Selection<'b>> {
        let table = base
            .tables
            .first()
            .ok_or_else(|| ExportError::MissingSelection("base has no tables".to_string()))?;
        let view = table
            .views
            .first()
            .ok_or_else(|| ExportError::MissingSelection(format!("table '{}' has no views", table.name)))?;

        Ok(Selection { table, view })
    }
}

/// Which provider the configuration selects by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Manual,
    #[default]
    Cursor,
    First,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Cursor => write!(f, "cursor"),
            Self::First => write!(f, "first"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "cursor" => Ok(Self::Cursor),
            "first" => Ok(Self::First),
            other => Err(format!("unknown selection mode '{}'", other)),
        }
    }
}
