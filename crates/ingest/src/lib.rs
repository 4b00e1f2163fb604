pub mod error;
pub mod grouping;
pub mod normalizer;
pub mod reader;
pub mod table;
pub mod writer;

pub use error::{IngestError, Result};
pub use grouping::{group_by_title, GroupedJobs};
pub use normalizer::{normalize, NormalizerConfig, TableNormalizer};
pub use reader::TableReader;
pub use table::{Row, Table};
pub use writer::{write_grouped_json, TableWriter};

use std::path::PathBuf;
use tracing::info;

/// Where the prepare stage reads from and writes to.
#[derive(Debug, Clone)]
pub struct PreparePaths {
    pub data_path: PathBuf,
    pub cleaned_csv_path: PathBuf,
    pub grouped_json_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    pub input_rows: usize,
    pub cleaned_rows: usize,
    pub titles: usize,
}

/// Load, clean and persist a table, then group it by title and persist that.
pub fn prepare(paths: &PreparePaths) -> Result<PrepareSummary> {
    let table = TableReader::read_csv(&paths.data_path)?;
    let input_rows = table.len();

    let (cleaned, groups) = clean_and_group(table)?;
    TableWriter::write_csv(&cleaned, &paths.cleaned_csv_path)?;
    write_grouped_json(&groups, &paths.grouped_json_path)?;

    let summary = PrepareSummary {
        input_rows,
        cleaned_rows: cleaned.len(),
        titles: groups.len(),
    };
    info!(
        input_rows = summary.input_rows,
        cleaned_rows = summary.cleaned_rows,
        grouped_rows = grouping::total_rows(&groups),
        titles = summary.titles,
        "Data cleaning and grouping complete"
    );
    Ok(summary)
}

/// In-memory half of [`prepare`]: returns the cleaned table and its grouping.
pub fn clean_and_group(table: Table) -> Result<(Table, GroupedJobs)> {
    if !table.has_column(normalizer::TITLE_COLUMN) {
        return Err(IngestError::MissingColumn(normalizer::TITLE_COLUMN.to_string()));
    }

    let cleaned = TableNormalizer::default().clean_table(table)?;
    let groups = group_by_title(cleaned.rows.clone());
    Ok((cleaned, groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;

    fn prepare_into(data_path: &Path, output_dir: &Path) -> Result<PrepareSummary> {
        prepare(&PreparePaths {
            data_path: data_path.to_path_buf(),
            cleaned_csv_path: output_dir.join("cleaned_data.csv"),
            grouped_json_path: output_dir.join("grouped_data.json"),
        })
    }

    #[test]
    fn test_prepare_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("postings.csv");
        std::fs::write(
            &data_path,
            "title,zip_code,max_salary,location,views\n\
             Engineer,94101.0,150000,San Francisco,12\n\
             ,10001,90000,New York,3\n\
             Analyst,,80000,Remote,\n\
             Engineer,2139,160000,Boston,7\n",
        )
        .unwrap();

        let summary = prepare_into(&data_path, dir.path()).unwrap();
        assert_eq!(
            summary,
            PrepareSummary { input_rows: 4, cleaned_rows: 3, titles: 2 }
        );

        let csv = std::fs::read_to_string(dir.path().join("cleaned_data.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "\"title\",\"zip_code\",\"location\"");
        assert_eq!(lines.next().unwrap(), "\"Engineer\",\"94101\",\"San Francisco\"");
        assert_eq!(lines.next().unwrap(), "\"Analyst\",\"\",\"Remote\"");
        assert_eq!(lines.next().unwrap(), "\"Engineer\",\"02139\",\"Boston\"");

        let grouped: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("grouped_data.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            grouped["Engineer"],
            json!([
                {"zip_code": "94101", "location": "San Francisco"},
                {"zip_code": "02139", "location": "Boston"}
            ])
        );
        assert_eq!(grouped["Analyst"], json!([{"zip_code": "", "location": "Remote"}]));
    }

    #[test]
    fn test_missing_title_column() {
        let table = Table::new(vec!["zip_code".into()], Vec::new());
        let err = clean_and_group(table).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(_)));
    }
}
