use serde_json::Value;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::table::{Row, Table};

pub const TITLE_COLUMN: &str = "title";
pub const ZIP_CODE_COLUMN: &str = "zip_code";

/// Columns that carry no value for the grouped job documents.
pub const DROPPED_COLUMNS: [&str; 17] = [
    "max_salary",
    "pay_period",
    "med_salary",
    "min_salary",
    "company_id",
    "views",
    "applies",
    "original_listed_time",
    "job_posting_url",
    "application_url",
    "application_type",
    "expiry",
    "closed_time",
    "listed_time",
    "posting_domain",
    "sponsored",
    "fips",
];

pub struct NormalizerConfig {
    pub dropped_columns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dropped_columns: DROPPED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

pub struct TableNormalizer {
    config: NormalizerConfig,
}

impl TableNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Drop untitled rows and denylisted columns, then canonicalize zip codes.
    pub fn normalize(&self, rows: Vec<Row>) -> Result<Vec<Row>> {
        let total = rows.len();
        let mut cleaned = Vec::with_capacity(total);

        for (index, mut row) in rows.into_iter().enumerate() {
            if row.get(TITLE_COLUMN).is_none_or(Value::is_null) {
                continue;
            }

            for column in &self.config.dropped_columns {
                row.shift_remove(column);
            }

            let zip = row.get(ZIP_CODE_COLUMN).unwrap_or(&Value::Null);
            let formatted = format_zip_code(zip)
                .ok_or_else(|| IngestError::InvalidZipCode {
                    row: index,
                    value: zip.to_string(),
                })?;
            row.insert(ZIP_CODE_COLUMN.to_string(), Value::String(formatted));

            cleaned.push(row);
        }

        debug!(
            input_rows = total,
            kept_rows = cleaned.len(),
            "Normalized rows"
        );
        Ok(cleaned)
    }

    /// Normalize the rows of a table and drop the same columns from its header.
    pub fn clean_table(&self, table: Table) -> Result<Table> {
        let Table { columns, rows } = table;

        let mut columns: Vec<String> = columns
            .into_iter()
            .filter(|c| !self.config.dropped_columns.contains(c))
            .collect();
        if !columns.iter().any(|c| c == ZIP_CODE_COLUMN) {
            columns.push(ZIP_CODE_COLUMN.to_string());
        }

        let rows = self.normalize(rows)?;
        Ok(Table::new(columns, rows))
    }
}

impl Default for TableNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

/// Convenience wrapper using the default denylist.
pub fn normalize(rows: Vec<Row>) -> Result<Vec<Row>> {
    TableNormalizer::default().normalize(rows)
}

/// `None` when a non-null value cannot be read as a number.
pub fn format_zip_code(value: &Value) -> Option<String> {
    let number = match value {
        Value::Null => return Some(String::new()),
        Value::Number(n) => match n.as_i64() {
            Some(int) => return Some(format!("{int:05}")),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() {
        return None;
    }
    // Integral floats print exactly at any magnitude; `+ 0.0` turns -0.0 into 0.0
    let truncated = number.trunc() + 0.0;
    Some(format!("{truncated:05.0}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_zip_code_formatting() {
        assert_eq!(format_zip_code(&json!("94101.0")).unwrap(), "94101");
        assert_eq!(format_zip_code(&json!(2139.0)).unwrap(), "02139");
        assert_eq!(format_zip_code(&json!(501)).unwrap(), "00501");
        assert_eq!(format_zip_code(&json!(" 10001 ")).unwrap(), "10001");
        assert_eq!(format_zip_code(&json!(12345.9)).unwrap(), "12345");
        assert_eq!(format_zip_code(&Value::Null).unwrap(), "");
    }

    #[test]
    fn test_zip_code_extremes() {
        assert_eq!(format_zip_code(&json!(-0.5)).unwrap(), "00000");
        assert_eq!(format_zip_code(&json!(-5.0)).unwrap(), "-0005");
        assert_eq!(format_zip_code(&json!(123456)).unwrap(), "123456");
        assert_eq!(format_zip_code(&json!("1e20")).unwrap(), "100000000000000000000");
        assert_eq!(format_zip_code(&json!(9.3e18)).unwrap(), "9300000000000000000");
        assert_eq!(format_zip_code(&json!(u64::MAX)).unwrap(), "18446744073709551616");
    }

    #[test]
    fn test_zip_code_rejects_text() {
        assert!(format_zip_code(&json!("SW1A 1AA")).is_none());
        assert!(format_zip_code(&json!("inf")).is_none());
        assert!(format_zip_code(&json!(true)).is_none());
    }

    #[test]
    fn test_normalize_drops_untitled_rows_and_columns() {
        let rows = vec![
            row(json!({"title": "Engineer", "zip_code": "94101.0", "max_salary": 150000, "location": "SF"})),
            row(json!({"title": null, "zip_code": 10001, "max_salary": 90000, "location": "NY"})),
            row(json!({"zip_code": 10001, "location": "NY"})),
            row(json!({"title": "Analyst", "zip_code": null, "views": 3, "location": "LA"})),
        ];

        let cleaned = normalize(rows).unwrap();

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0]["title"], json!("Engineer"));
        assert_eq!(cleaned[0]["zip_code"], json!("94101"));
        assert!(!cleaned[0].contains_key("max_salary"));
        assert_eq!(cleaned[1]["title"], json!("Analyst"));
        assert_eq!(cleaned[1]["zip_code"], json!(""));
        assert!(!cleaned[1].contains_key("views"));
        assert_eq!(cleaned[1]["location"], json!("LA"));
    }

    #[test]
    fn test_normalize_fails_on_bad_zip() {
        let rows = vec![
            row(json!({"title": "Engineer", "zip_code": "94101"})),
            row(json!({"title": "Chef", "zip_code": "N/A"})),
        ];

        let err = normalize(rows).unwrap_err();
        assert!(matches!(err, IngestError::InvalidZipCode { row: 1, .. }));
    }

    #[test]
    fn test_untitled_row_with_bad_zip_is_dropped_first() {
        let rows = vec![row(json!({"title": null, "zip_code": "N/A"}))];
        assert!(normalize(rows).unwrap().is_empty());
    }

    #[test]
    fn test_clean_table_updates_header() {
        let table = Table::new(
            vec!["title".into(), "fips".into(), "location".into()],
            vec![row(json!({"title": "Engineer", "fips": 6075, "location": "SF"}))],
        );

        let cleaned = TableNormalizer::default().clean_table(table).unwrap();

        assert_eq!(cleaned.columns, vec!["title", "location", "zip_code"]);
        assert_eq!(cleaned.rows[0]["zip_code"], json!(""));
    }
}
