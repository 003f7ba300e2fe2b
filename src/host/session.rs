use tracing::{info, warn};

use super::base::Base;
use super::selection::ActiveSelectionProvider;
use crate::error::Result;
use crate::export::TabularExporter;
use crate::models::{ExportRequest, ExportResult};

/// Resolves the selection, reads its records and exports them.
///
/// The record query is released on every path, including failures.
pub fn export_view(
    base: &Base,
    provider: &dyn ActiveSelectionProvider,
    request: &ExportRequest,
    exporter: &TabularExporter,
) -> Result<ExportResult> {
    let selection = provider.resolve(base)?;
    info!(
        table = %selection.table.name,
        view = %selection.view.name,
        format = %request.format,
        "exporting view"
    );

    let mut request = request.clone();
    request.context.get_or_insert_with(|| selection.context());

    let query = base.select_records(selection.table, selection.view);
    let columns = query.columns();
    let result = exporter.export(&columns, query.rows(), &request);
    drop(query);

    match &result {
        Ok(output) => info!(
            records = output.record_count,
            bytes = output.bytes.len(),
            filename = %output.suggested_filename,
            "export finished"
        ),
        Err(e) => warn!(error = %e, "export failed"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::host::{CursorTracking, Manual};
    use crate::models::ExportFormat;

    fn base() -> Base {
        Base::from_json(
            r#"{
            "tables": [{
                "id": "tbl1", "name": "Tasks",
                "fields": [{"id": "f1", "name": "Title"}, {"id": "f2", "name": "Done"}],
                "views": [
                    {"id": "v1", "name": "Everything"},
                    {"id": "v2", "name": "Nothing", "record_ids": []}
                ],
                "records": [
                    {"id": "r1", "cells": {"f1": "Write docs", "f2": true}},
                    {"id": "r2", "cells": {"f1": "Ship"}}
                ]
            }],
            "cursor": {"active_table_id": "tbl1", "active_view_id": "v1"}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_export_active_view() {
        let base = base();
        let result = export_view(
            &base,
            &CursorTracking::new(),
            &ExportRequest::new(ExportFormat::Csv).with_filename("tasks"),
            &TabularExporter::new(),
        )
        .unwrap();

        assert_eq!(result.record_count, 2);
        assert_eq!(result.suggested_filename, "tasks.csv");
        assert_eq!(
            String::from_utf8(result.bytes).unwrap(),
            "\"Title\",\"Done\"\n\"Write docs\",\"true\"\n\"Ship\",\"\""
        );
        assert_eq!(base.open_query_count(), 0);
    }

    #[test]
    fn test_default_filename_uses_selection() {
        let base = base();
        let result = export_view(
            &base,
            &Manual::new("Tasks", "Everything"),
            &ExportRequest::new(ExportFormat::Xlsx),
            &TabularExporter::new(),
        )
        .unwrap();

        assert!(result.suggested_filename.starts_with("Tasks_Everything_"));
        assert!(result.suggested_filename.ends_with(".xlsx"));
    }

    #[test]
    fn test_query_released_when_export_fails() {
        let base = base();
        let err = export_view(
            &base,
            &Manual::new("Tasks", "Nothing"),
            &ExportRequest::new(ExportFormat::Csv).require_records(true),
            &TabularExporter::new(),
        )
        .unwrap_err();

        assert!(matches!(err, ExportError::NoData));
        assert_eq!(base.open_query_count(), 0);
    }
}
