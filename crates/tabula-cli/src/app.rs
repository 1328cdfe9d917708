//! Application state management.

use crate::TableArgs;
use anyhow::{bail, Context};
use std::sync::Arc;
use tabula_core::{Config, Dataset, FileSource, FileStorage, Table, TableOptions};
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// Persisted table configurations
    pub storage: Arc<FileStorage>,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let data_dir = config.storage_dir()?;
        let storage = Arc::new(FileStorage::open(&data_dir)?);

        info!(
            data_dir = %data_dir.display(),
            "Application initialized"
        );

        Ok(App { config, storage })
    }

    /// Build a table over a dataset file and load its rows through the
    /// file data source.
    pub fn open_table(&self, args: &TableArgs) -> anyhow::Result<(Table, FileSource)> {
        let dataset = Dataset::load(&args.dataset)
            .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;

        let mut options = TableOptions::from_config(&self.config);
        if let Some(identifier) = args.identifier.clone().or(dataset.identifier) {
            options.identifier = identifier;
        }
        options.table_name = args.table.clone();

        let mut table = Table::builder(dataset.columns)
            .with_options(options)
            .with_storage(self.storage.clone())
            .build()?;

        let source = FileSource::new(&args.dataset);
        table.reload_data(&source);
        if table.loading_error() {
            bail!("Failed to load rows from {}", args.dataset.display());
        }

        Ok((table, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tabula_core::ConfigStorage;
    use tempfile::TempDir;

    fn app_in(dir: &Path) -> App {
        let mut config = Config::default();
        config.general.storage_dir = Some(dir.join("data"));
        App::new(config).unwrap()
    }

    fn args(dataset: &Path) -> TableArgs {
        TableArgs {
            dataset: dataset.to_path_buf(),
            table: None,
            identifier: None,
        }
    }

    #[test]
    fn test_open_table_loads_rows() {
        let temp_dir = TempDir::new().unwrap();
        let dataset = temp_dir.path().join("hosts.json");
        fs::write(
            &dataset,
            r#"{"identifier": "id", "columns": [{"prop": "id", "name": "ID"}, {"prop": "name", "name": "Host name"}],
                "rows": [{"id": 1, "name": "web-1"}, {"id": 2, "name": "db-1"}]}"#,
        )
        .unwrap();

        let app = app_in(temp_dir.path());
        let (mut table, _source) = app.open_table(&args(&dataset)).unwrap();
        assert_eq!(table.identifier(), "id");
        assert_eq!(table.data().len(), 2);

        table.set_search("host:web").unwrap();
        assert_eq!(table.row_count(), 1);

        let stored = app.storage.get("id").unwrap().unwrap();
        assert_eq!(stored, table.user_config().to_json().unwrap());
    }

    #[test]
    fn test_configuration_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let dataset = temp_dir.path().join("rows.json");
        fs::write(&dataset, r#"[{"a": 1, "b": 2}, {"a": 3, "b": 4}]"#).unwrap();

        let mut table_args = args(&dataset);
        table_args.table = Some("numbers".to_string());

        {
            let app = app_in(temp_dir.path());
            let (mut table, _source) = app.open_table(&table_args).unwrap();
            table.toggle_column("a", false).unwrap();
            table.set_limit("1").unwrap();
        }

        let app = app_in(temp_dir.path());
        let (table, _source) = app.open_table(&table_args).unwrap();
        assert_eq!(table.storage_key(), Some("numbers"));
        assert_eq!(table.table_columns().len(), 1);
        assert_eq!(table.limit(), 1);
        assert_eq!(table.page_count(), 2);
    }

    #[test]
    fn test_open_table_rejects_bad_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let dataset = temp_dir.path().join("bad.json");
        fs::write(&dataset, "[]").unwrap();

        let app = app_in(temp_dir.path());
        assert!(app.open_table(&args(&dataset)).is_err());
    }
}
