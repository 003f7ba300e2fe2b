use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Column, Row};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub cells: HashMap<String, Value>,
    /// Display text the host renders for a cell (dates, currency, links).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub formatted: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
    /// Visible field ids in display order; empty means every table field.
    #[serde(default)]
    pub visible_field_ids: Vec<String>,
    /// Record ids in view order after filters and sorts; `None` means table order.
    #[serde(default)]
    pub record_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Table {
    pub fn view(&self, id_or_name: &str) -> Option<&View> {
        self.views
            .iter()
            .find(|v| v.id == id_or_name)
            .or_else(|| self.views.iter().find(|v| v.name == id_or_name))
    }

    pub fn view_by_id(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn field_by_id(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields shown by `view`, in display order. Unknown ids are skipped.
    pub fn visible_fields(&self, view: &View) -> Vec<&Field> {
        if view.visible_field_ids.is_empty() {
            return self.fields.iter().collect();
        }

        view.visible_field_ids
            .iter()
            .filter_map(|id| self.field_by_id(id))
            .collect()
    }

    /// Records of `view`, in view order. Unknown ids are skipped.
    pub fn view_records(&self, view: &View) -> Vec<&Record> {
        match &view.record_ids {
            None => self.records.iter().collect(),
            Some(ids) => {
                let by_id: HashMap<&str, &Record> =
                    self.records.iter().map(|r| (r.id.as_str(), r)).collect();
                ids.iter().filter_map(|id| by_id.get(id.as_str()).copied()).collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub active_table_id: Option<String>,
    pub active_view_id: Option<String>,
}

/// Snapshot of the host's data model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Base {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub cursor: Cursor,
    #[serde(skip)]
    open_queries: Arc<AtomicUsize>,
}

impl Base {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading base snapshot");
        let content = tokio::fs::read_to_string(path).await?;
        let base = Self::from_json(&content)?;
        info!(tables = base.tables.len(), name = %base.name, "base snapshot loaded");
        Ok(base)
    }

    pub fn table(&self, id_or_name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.id == id_or_name)
            .or_else(|| self.tables.iter().find(|t| t.name == id_or_name))
    }

    pub fn table_by_id(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Queries acquired and not yet released.
    pub fn open_query_count(&self) -> usize {
        self.open_queries.load(Ordering::SeqCst)
    }

    /// Loads the visible fields and records of `view`.
    ///
    /// The query stays open until the returned handle is dropped.
    pub fn select_records<'b>(&'b self, table: &'b Table, view: &'b View) -> RecordQuery<'b> {
        self.open_queries.fetch_add(1, Ordering::SeqCst);
        let query = RecordQuery {
            fields: table.visible_fields(view),
            records: table.view_records(view),
            open_queries: Arc::clone(&self.open_queries),
        };
        debug!(
            table = %table.name,
            view = %view.name,
            fields = query.fields.len(),
            records = query.records.len(),
            "record query acquired"
        );
        query
    }
}

/// Open host query over one view. Released on drop.
#[derive(Debug)]
pub struct RecordQuery<'b> {
    fields: Vec<&'b Field>,
    records: Vec<&'b Record>,
    open_queries: Arc<AtomicUsize>,
}

impl<'b> RecordQuery<'b> {
    pub fn fields(&self) -> &[&'b Field] {
        &self.fields
    }

    /// Field names as export columns, positioned by field order.
    pub fn columns(&self) -> Vec<Column> {
        Column::from_names(self.fields.iter().map(|f| f.name.clone()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RecordRow<'_>> {
        self.records.iter().map(move |&record| RecordRow {
            record,
            fields: &self.fields,
        })
    }
}

impl Drop for RecordQuery<'_> {
    fn drop(&mut self) {
        self.open_queries.fetch_sub(1, Ordering::SeqCst);
        debug!(records = self.records.len(), "record query released");
    }
}

/// One record seen through a query's field list.
#[derive(Debug, Clone, Copy)]
pub struct RecordRow<'q> {
    record: &'q Record,
    fields: &'q [&'q Field],
}

impl RecordRow<'_> {
    fn field_id(&self, column: &Column) -> Option<&str> {
        self.fields.get(column.position).map(|f| f.id.as_str())
    }
}

impl Row for RecordRow<'_> {
    fn cell_value_raw(&self, column: &Column) -> Option<&Value> {
        self.field_id(column).and_then(|id| self.record.cells.get(id))
    }

    fn cell_value_as_string(&self, column: &Column) -> Option<String> {
        self.field_id(column)
            .and_then(|id| self.record.formatted.get(id))
            .cloned()
    }
}
