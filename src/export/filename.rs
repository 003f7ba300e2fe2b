use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ExportFormat, SelectionContext};

static ILLEGAL_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>]+"#).expect("filename pattern is valid"));

/// `YYYY-MM-DD`, zero padded.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `{table}_{view}_{date}`, or `export_{date}` without a selection.
pub fn default_base(context: Option<&SelectionContext>, date: NaiveDate) -> String {
    match context {
        Some(ctx) => format!("{}_{}_{}", ctx.table_name, ctx.view_name, date_stamp(date)),
        None => format!("export_{}", date_stamp(date)),
    }
}

/// Replaces each run of characters that are illegal in filenames with `-`.
pub fn sanitize_filename(name: &str) -> String {
    ILLEGAL_FILENAME_CHARS.replace_all(name, "-").into_owned()
}

/// Picks the custom name unless blank, sanitizes it and ensures the extension.
pub fn resolve_filename(custom_name: Option<&str>, default_base: &str, format: ExportFormat) -> String {
    let base = custom_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(default_base);

    let sanitized = sanitize_filename(base.trim());
    let extension = format!(".{}", format.extension());

    if sanitized.to_lowercase().ends_with(&extension) {
        sanitized
    } else {
        format!("{}{}", sanitized, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extension_not_duplicated() {
        assert_eq!(
            resolve_filename(Some("report.xlsx"), "ignored", ExportFormat::Xlsx),
            "report.xlsx"
        );
        assert_eq!(
            resolve_filename(Some("REPORT.XLSX"), "ignored", ExportFormat::Xlsx),
            "REPORT.XLSX"
        );
        assert_eq!(resolve_filename(Some("report"), "ignored", ExportFormat::Xlsx), "report.xlsx");
    }

    #[test]
    fn test_blank_uses_default() {
        assert_eq!(
            resolve_filename(Some(""), "Table_View_2024-01-01", ExportFormat::Csv),
            "Table_View_2024-01-01.csv"
        );
        assert_eq!(
            resolve_filename(Some("   "), "Table_View_2024-01-01", ExportFormat::Csv),
            "Table_View_2024-01-01.csv"
        );
        assert_eq!(
            resolve_filename(None, "Table_View_2024-01-01", ExportFormat::Xlsx),
            "Table_View_2024-01-01.xlsx"
        );
    }

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(
            resolve_filename(Some(" Q1/Q2: \"final\" "), "ignored", ExportFormat::Csv),
            "Q1-Q2- -final-.csv"
        );
        assert_eq!(sanitize_filename("a<>b|c*d?e%f\\g"), "a-b-c-d-e-f-g");
    }

    #[test]
    fn test_other_extension_is_kept_and_appended() {
        assert_eq!(
            resolve_filename(Some("report.csv"), "ignored", ExportFormat::Xlsx),
            "report.csv.xlsx"
        );
    }

    #[test]
    fn test_default_base() {
        let ctx = SelectionContext::new("Contacts", "Grid view");
        assert_eq!(default_base(Some(&ctx), day(2024, 3, 7)), "Contacts_Grid view_2024-03-07");
        assert_eq!(default_base(None, day(2024, 12, 25)), "export_2024-12-25");
    }

    #[test]
    fn test_default_base_is_sanitized_on_resolve() {
        let ctx = SelectionContext::new("Sales/EU", "Q1:open");
        let base = default_base(Some(&ctx), day(2024, 1, 1));
        assert_eq!(
            resolve_filename(None, &base, ExportFormat::Csv),
            "Sales-EU_Q1-open_2024-01-01.csv"
        );
    }
}
