use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::grouping::GroupedJobs;
use crate::table::{render_cell, Table};

pub struct TableWriter;

impl TableWriter {
    /// Write the table with a header row, quoting every field.
    pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
        let file = create_file(path)?;
        Self::to_writer(table, file)?;
        info!(path = %path.display(), rows = table.len(), "Cleaned CSV saved");
        Ok(())
    }

    pub fn to_writer<W: Write>(table: &Table, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(writer);

        writer.write_record(&table.columns)?;
        for row in &table.rows {
            let record: Vec<String> = table
                .columns
                .iter()
                .map(|c| row.get(c).map(render_cell).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        writer
            .flush()
            .map_err(|e| IngestError::Csv(csv::Error::from(e)))?;
        Ok(())
    }
}

/// Write the grouped rows as pretty JSON with a four-space indent.
pub fn write_grouped_json(groups: &GroupedJobs, path: &Path) -> Result<()> {
    let file = create_file(path)?;
    let mut writer = BufWriter::new(file);
    grouped_json_to_writer(groups, &mut writer)?;
    writer.flush().map_err(|e| IngestError::io(path, e))?;

    info!(path = %path.display(), titles = groups.len(), "Grouped JSON saved");
    Ok(())
}

pub fn grouped_json_to_writer<W: Write>(groups: &GroupedJobs, writer: W) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    groups.serialize(&mut serializer)?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| IngestError::io(parent, e))?;
    }
    File::create(path).map_err(|e| IngestError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_csv_quotes_all_fields() {
        let table = Table::new(
            vec!["title".into(), "zip_code".into(), "remote".into()],
            vec![row(json!({"title": "Engineer", "zip_code": "02139", "remote": null}))],
        );

        let mut out = Vec::new();
        TableWriter::to_writer(&table, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\"title\",\"zip_code\",\"remote\"\n\"Engineer\",\"02139\",\"\"\n"
        );
    }

    #[test]
    fn test_grouped_json_renders_nulls() {
        let mut groups = GroupedJobs::new();
        groups.insert(
            "Engineer".to_string(),
            vec![row(json!({"zip_code": "94101", "remote_allowed": null}))],
        );

        let mut out = Vec::new();
        grouped_json_to_writer(&groups, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"remote_allowed\": null"));
        assert!(text.contains("\n    \"Engineer\": ["));

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["Engineer"][0]["zip_code"], json!("94101"));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/grouped.json");

        write_grouped_json(&GroupedJobs::new(), &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
