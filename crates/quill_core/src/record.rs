use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder shown for any absent text, id, or timestamp value.
pub const PLACEHOLDER: &str = "N/A";

/// Display format for every timestamp in a report (`yyyy-MM-dd HH:mm:ss`).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_FILE_PATH_LEN: usize = 512;
pub const MAX_ISSUE_TYPE_LEN: usize = 100;

/// Number of columns in the detail table.
pub const DETAIL_COLUMN_COUNT: usize = 8;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One code analysis finding: a scanned file with its line and issue counts.
///
/// Every field is optional. Renderers never fail on a missing value; they show
/// [`PLACEHOLDER`] for text and timestamps and `0` for counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub id: Option<i64>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub code_line: Option<u32>,
    pub issue_count: Option<u32>,
    pub issue_type: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A field that exceeds its maximum length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub max_len: usize,
    pub actual_len: usize,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is {} characters long (max {})",
            self.field, self.actual_len, self.max_len
        )
    }
}

impl Record {
    /// Issue type, or `None` when absent or empty. Empty categories are not
    /// counted in statistics.
    pub fn category(&self) -> Option<&str> {
        self.issue_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn code_lines_or_zero(&self) -> u64 {
        self.code_line.map(u64::from).unwrap_or(0)
    }

    pub fn issues_or_zero(&self) -> u64 {
        self.issue_count.map(u64::from).unwrap_or(0)
    }

    /// Check the length limits on the text fields.
    pub fn validate(&self) -> Vec<FieldViolation> {
        let checks = [
            ("fileName", self.file_name.as_deref(), MAX_FILE_NAME_LEN),
            ("filePath", self.file_path.as_deref(), MAX_FILE_PATH_LEN),
            ("issueType", self.issue_type.as_deref(), MAX_ISSUE_TYPE_LEN),
        ];

        checks
            .into_iter()
            .filter_map(|(field, value, max_len)| {
                let actual_len = value?.chars().count();
                (actual_len > max_len).then_some(FieldViolation {
                    field,
                    max_len,
                    actual_len,
                })
            })
            .collect()
    }

    /// The eight detail-table cells in column order with placeholders applied.
    ///
    /// All renderers build their detail rows from this, so the same record
    /// reads the same in every format.
    pub fn detail_cells(&self) -> [String; DETAIL_COLUMN_COUNT] {
        [
            text_or_placeholder(self.id.map(|id| id.to_string())),
            text_or_placeholder(self.file_name.clone()),
            text_or_placeholder(self.file_path.clone()),
            self.code_lines_or_zero().to_string(),
            self.issues_or_zero().to_string(),
            text_or_placeholder(self.category().map(String::from)),
            format_timestamp(self.created_at.as_ref()),
            format_timestamp(self.updated_at.as_ref()),
        ]
    }
}

/// Format an optional timestamp with [`DATE_TIME_FORMAT`].
pub fn format_timestamp(value: Option<&NaiveDateTime>) -> String {
    match value {
        Some(ts) => ts.format(DATE_TIME_FORMAT).to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn text_or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_detail_cells_full_record() {
        let record = Record {
            id: Some(1),
            file_name: Some("A.java".into()),
            file_path: Some("/src/A.java".into()),
            code_line: Some(100),
            issue_count: Some(5),
            issue_type: Some("bug".into()),
            created_at: Some(ts(2024, 1, 1)),
            updated_at: None,
        };
        let cells = record.detail_cells();
        assert_eq!(
            cells,
            [
                "1",
                "A.java",
                "/src/A.java",
                "100",
                "5",
                "bug",
                "2024-01-01 00:00:00",
                "N/A"
            ]
        );
    }

    #[test]
    fn test_detail_cells_empty_record_uses_placeholders() {
        let cells = Record::default().detail_cells();
        assert_eq!(
            cells,
            ["N/A", "N/A", "N/A", "0", "0", "N/A", "N/A", "N/A"]
        );
    }

    #[test]
    fn test_empty_issue_type_is_not_a_category() {
        let record = Record {
            issue_type: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(record.category(), None);
        assert_eq!(record.detail_cells()[5], PLACEHOLDER);
    }

    #[test]
    fn test_validate_accepts_limits() {
        let record = Record {
            file_name: Some("a".repeat(MAX_FILE_NAME_LEN)),
            file_path: Some("p".repeat(MAX_FILE_PATH_LEN)),
            issue_type: Some("t".repeat(MAX_ISSUE_TYPE_LEN)),
            ..Default::default()
        };
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_each_overlong_field() {
        let record = Record {
            file_name: Some("a".repeat(MAX_FILE_NAME_LEN + 1)),
            issue_type: Some("t".repeat(MAX_ISSUE_TYPE_LEN + 5)),
            ..Default::default()
        };
        let violations = record.validate();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "fileName");
        assert_eq!(violations[0].actual_len, 256);
        assert_eq!(violations[1].field, "issueType");
        assert!(violations[1].to_string().contains("max 100"));
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let record = Record {
            issue_type: Some("缺".repeat(MAX_ISSUE_TYPE_LEN)),
            ..Default::default()
        };
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_deserialize_camel_case_with_missing_fields() {
        let json = r#"{"id":7,"fileName":"B.rs","codeLine":12,"createdAt":"2024-01-01T00:00:00"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.file_name.as_deref(), Some("B.rs"));
        assert_eq!(record.code_line, Some(12));
        assert_eq!(record.issue_count, None);
        assert_eq!(record.created_at, Some(ts(2024, 1, 1)));
        assert_eq!(record.updated_at, None);
    }
}
