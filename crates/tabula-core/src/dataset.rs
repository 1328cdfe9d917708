//! JSON datasets and the file-backed data source.
//!
//! A dataset file is either a bare array of row objects, in which case the
//! columns are inferred from the first row, or a described dataset:
//!
//! ```json
//! {
//!   "identifier": "id",
//!   "columns": [{ "prop": "id", "name": "ID" }, { "prop": "name", "name": "Host name" }],
//!   "rows": [{ "id": 1, "name": "web-1" }]
//! }
//! ```

use crate::error::{Result, TabulaError};
use crate::fetch::{DataSource, FetchContext};
use crate::types::{infer_columns, Column, Row};
use crate::value::CellValue;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Columns and rows loaded from JSON
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Preferred identifier, if the file names one
    pub identifier: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

/// A row as written in the file; keys keep their document order
type RawRow = Map<String, Value>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDataset {
    Rows(Vec<RawRow>),
    Described {
        #[serde(default)]
        identifier: Option<String>,
        #[serde(default)]
        columns: Vec<Column>,
        rows: Vec<RawRow>,
    },
}

fn decode_row(index: usize, raw: RawRow) -> Result<Row> {
    raw.into_iter()
        .map(|(key, value)| {
            let cell = CellValue::deserialize(value).map_err(|e| {
                TabulaError::dataset(format!("row {}, cell {}: {}", index, key, e))
            })?;
            Ok((key, cell))
        })
        .collect()
}

impl Dataset {
    /// Parse a dataset from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDataset = serde_json::from_str(json)
            .map_err(|e| TabulaError::dataset(format!("not a row array or dataset object: {}", e)))?;

        let (identifier, mut columns, raw_rows) = match raw {
            RawDataset::Rows(rows) => (None, Vec::new(), rows),
            RawDataset::Described {
                identifier,
                columns,
                rows,
            } => (identifier, columns, rows),
        };

        if columns.is_empty() {
            if let Some(first) = raw_rows.first() {
                columns = infer_columns(first.keys().map(String::as_str));
            }
        }
        if columns.is_empty() {
            return Err(TabulaError::dataset("no columns declared and no rows to infer them from"));
        }

        let rows = raw_rows
            .into_iter()
            .enumerate()
            .map(|(i, raw)| decode_row(i, raw))
            .collect::<Result<Vec<Row>>>()?;

        Ok(Dataset {
            identifier,
            columns,
            rows,
        })
    }

    /// Read and parse a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let dataset = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            columns = dataset.columns.len(),
            rows = dataset.rows.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }
}

/// A data source that re-reads a dataset file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn fetch(&self, context: FetchContext) {
        match Dataset::load(&self.path) {
            Ok(dataset) => context.succeed(dataset.rows),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load dataset");
                context.fail();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchOutcome;
    use tempfile::TempDir;

    #[test]
    fn test_row_array_infers_columns() {
        let dataset = Dataset::from_json(r#"[{"b": 1, "a": "x"}, {"a": "y"}]"#).unwrap();
        assert_eq!(dataset.identifier, None);
        let props: Vec<&str> = dataset.columns.iter().map(|c| c.prop.as_str()).collect();
        assert_eq!(props, vec!["b", "a"]);
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[1].get("a"), Some(&CellValue::from("y")));
    }

    #[test]
    fn test_described_dataset() {
        let dataset = Dataset::from_json(
            r#"{
                "identifier": "id",
                "columns": [{"prop": "id", "name": "ID"}, {"prop": "tags", "name": "Tags", "isHidden": true}],
                "rows": [{"id": 1, "tags": ["a", "b"], "owner": null}]
            }"#,
        )
        .unwrap();
        assert_eq!(dataset.identifier.as_deref(), Some("id"));
        assert_eq!(dataset.columns.len(), 2);
        assert!(dataset.columns[1].is_hidden);
        assert_eq!(dataset.rows[0].get("owner"), Some(&CellValue::Null));
    }

    #[test]
    fn test_inferred_identifier_follows_document_order() {
        let dataset = Dataset::from_json(r#"[{"name": "web", "ip": "10.0.0.1"}]"#).unwrap();
        assert_eq!(dataset.columns[0].prop, "name");

        let table = crate::table::Table::builder(dataset.columns)
            .with_data(dataset.rows)
            .build()
            .unwrap();
        assert_eq!(table.identifier(), "name");
        assert_eq!(table.sorts()[0].prop, "name");
    }

    #[test]
    fn test_unsupported_cell_rejected() {
        assert!(matches!(
            Dataset::from_json(r#"[{"a": {"nested": true}}]"#),
            Err(TabulaError::DatasetInvalid { .. })
        ));
    }

    #[test]
    fn test_invalid_datasets() {
        for json in ["[]", "{\"rows\": []}", "42", "{\"columns\": []}", "not json"] {
            assert!(
                matches!(Dataset::from_json(json), Err(TabulaError::DatasetInvalid { .. })),
                "{json}"
            );
        }
    }

    #[test]
    fn test_file_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hosts.json");
        fs::write(&path, r#"[{"id": 1}, {"id": 2}]"#).unwrap();

        let source = FileSource::new(&path);
        let (context, receiver) = FetchContext::new();
        source.fetch(context);
        match receiver.try_recv().unwrap() {
            FetchOutcome::Loaded(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_file_source_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileSource::new(temp_dir.path().join("missing.json"));
        let (context, receiver) = FetchContext::new();
        source.fetch(context);
        assert!(matches!(
            receiver.try_recv().unwrap(),
            FetchOutcome::Failed(_)
        ));
    }
}
