use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::{IngestError, Result};
use crate::table::{parse_cell, Row, Table};

pub struct TableReader;

impl TableReader {
    pub fn read_csv(path: &Path) -> Result<Table> {
        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        let table = Self::from_reader(file)?;

        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "Loaded CSV table"
        );
        Ok(table)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            // Short records are padded with nulls, long ones would lose cells
            if record.len() > columns.len() {
                return Err(IngestError::RaggedRecord {
                    line: record.position().map_or(0, |p| p.line()),
                    expected: columns.len(),
                    found: record.len(),
                });
            }

            let mut row = Row::new();
            for (i, column) in columns.iter().enumerate() {
                let value = record.get(i).map(parse_cell).unwrap_or(serde_json::Value::Null);
                row.insert(column.clone(), value);
            }
            rows.push(row);
        }

        Ok(Table::new(columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_typed_rows() {
        let data = "title,zip_code,max_salary\nEngineer,94101.0,150000\n,,\n";
        let table = TableReader::from_reader(data.as_bytes()).unwrap();

        assert_eq!(table.columns, vec!["title", "zip_code", "max_salary"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0]["title"], json!("Engineer"));
        assert_eq!(table.rows[0]["max_salary"], json!(150000));
        assert_eq!(table.rows[1]["title"], serde_json::Value::Null);
    }

    #[test]
    fn test_missing_markers_drop_title_and_blank_zip() {
        let data = "title,zip_code,location\nEngineer,NA,SF\nNA,94101,NY\nN/A,,LA\n";
        let table = TableReader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.rows[0]["zip_code"], serde_json::Value::Null);

        let cleaned = crate::normalize(table.rows).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0]["title"], json!("Engineer"));
        assert_eq!(cleaned[0]["zip_code"], json!(""));
    }

    #[test]
    fn test_short_record_is_padded() {
        let data = "title,zip_code,location\nEngineer,94101\n";
        let table = TableReader::from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.rows[0]["location"], serde_json::Value::Null);
    }

    #[test]
    fn test_long_record_is_rejected() {
        let data = "title,zip_code\nEngineer,94101\nEngineer,94101,San Francisco,150000\n";
        let err = TableReader::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IngestError::RaggedRecord { line: 3, expected: 2, found: 4 }
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TableReader::read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
