//! The table state machine.
//!
//! A [`Table`] owns a dataset, its column declarations and the user's
//! display configuration, and keeps them consistent:
//!
//! - the search string is tokenized and applied to produce the visible rows
//! - column toggles maintain a non-empty visible column set and a valid sort
//! - every change to sorts, columns, search or limit is persisted under the
//!   table identifier
//! - reloads go through a [`DataSource`] with at most one request in flight,
//!   after which the selection is reconciled
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tabula_core::{Column, MemoryStorage, Table};
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let mut table = Table::builder(vec![Column::new("a", "Index")])
//!     .with_storage(storage)
//!     .build()
//!     .unwrap();
//!
//! table.set_search("5").unwrap();
//! assert_eq!(table.search(), "5");
//! ```

use crate::config::Config;
use crate::custom_class::CustomClasses;
use crate::error::{Result, TabulaError};
use crate::events::{NoopObserver, TableEvent, TableObserver};
use crate::fetch::{DataSource, FetchContext, FetchErrorConfig, FetchOutcome, FetchState};
use crate::filter::{all_rows, filter_rows};
use crate::search::SearchQuery;
use crate::selection::{reconcile, Selection, UpdateSelection};
use crate::sort::{create_sorting_definition, sort_indices, SortDefinition};
use crate::storage::ConfigStorage;
use crate::types::{Column, Row};
use crate::user_config::{ColumnState, ConfigStore, UserConfig};
use crate::value::CellValue;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Identifier used when none is given
pub const DEFAULT_IDENTIFIER: &str = "id";

/// Layout weight of the identifier column
const IDENTIFIER_FLEX_GROW: u32 = 1;
/// Layout weight of every other column
const DEFAULT_FLEX_GROW: u32 = 2;

/// Construction-time options of a table.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Unique row key; falls back to the first column unless forced
    pub identifier: String,

    /// Keep `identifier` even if no column carries it
    pub force_identifier: bool,

    /// Storage key; defaults to the identifier
    pub table_name: Option<String>,

    /// Persist and restore the user configuration
    pub auto_save: bool,

    /// Page size when nothing is stored
    pub default_limit: usize,

    /// Selection reconciliation policy after reloads
    pub update_selection_on_refresh: UpdateSelection,

    /// Parallel filter threshold (None = always sequential)
    pub parallel_threshold: Option<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            identifier: DEFAULT_IDENTIFIER.to_string(),
            force_identifier: false,
            table_name: None,
            auto_save: true,
            default_limit: 10,
            update_selection_on_refresh: UpdateSelection::OnChange,
            parallel_threshold: Some(10000),
        }
    }
}

impl TableOptions {
    /// Options seeded from the application configuration
    pub fn from_config(config: &Config) -> Self {
        TableOptions {
            auto_save: config.table.auto_save,
            default_limit: config.general.default_limit,
            update_selection_on_refresh: config.table.update_selection_on_refresh,
            parallel_threshold: config.parallel_threshold(),
            ..Default::default()
        }
    }
}

/// Builder for [`Table`].
pub struct TableBuilder {
    columns: Vec<Column>,
    options: TableOptions,
    storage: Option<Arc<dyn ConfigStorage>>,
    observer: Arc<dyn TableObserver>,
    custom_classes: Option<CustomClasses>,
    data: Vec<Row>,
}

impl TableBuilder {
    /// Replace all options at once
    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.options.identifier = identifier.into();
        self
    }

    /// Keep the identifier even if no column carries it
    pub fn force_identifier(mut self, force: bool) -> Self {
        self.options.force_identifier = force;
        self
    }

    /// Set an explicit storage key
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.options.table_name = Some(name.into());
        self
    }

    /// Persist the user configuration in `storage`
    pub fn with_storage(mut self, storage: Arc<dyn ConfigStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Receive table events
    pub fn with_observer(mut self, observer: Arc<dyn TableObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Enable custom cell classes
    pub fn with_custom_classes(mut self, classes: CustomClasses) -> Self {
        self.custom_classes = Some(classes);
        self
    }

    /// Initial dataset
    pub fn with_data(mut self, data: Vec<Row>) -> Self {
        self.data = data;
        self
    }

    /// Initialize the table: resolve the identifier, lay out the columns,
    /// restore or create the user configuration and filter the data.
    pub fn build(self) -> Result<Table> {
        let TableBuilder {
            mut columns,
            options,
            storage,
            observer,
            custom_classes,
            data,
        } = self;

        if columns.is_empty() {
            return Err(TabulaError::dataset("a table needs at least one column"));
        }

        let identifier = if options.force_identifier
            || columns.iter().any(|c| c.prop == options.identifier)
        {
            options.identifier.clone()
        } else {
            columns[0].prop.clone()
        };

        for column in &mut columns {
            let weight = if column.prop == identifier {
                IDENTIFIER_FLEX_GROW
            } else {
                DEFAULT_FLEX_GROW
            };
            column.flex_grow.get_or_insert(weight);
            column.resizeable.get_or_insert(false);
        }
        if columns.iter().all(|c| c.is_hidden) {
            columns[0].is_hidden = false;
        }

        let sort_prop = if columns.iter().any(|c| c.prop == identifier && !c.is_hidden) {
            identifier.clone()
        } else {
            first_visible(&columns).to_string()
        };

        let defaults = UserConfig {
            sorts: create_sorting_definition(&sort_prop),
            columns: columns
                .iter()
                .map(|c| ColumnState {
                    prop: c.prop.clone(),
                    is_hidden: c.is_hidden,
                })
                .collect(),
            search: String::new(),
            limit: options.default_limit.max(1),
        };

        let store = match storage {
            Some(storage) if options.auto_save => {
                let key = options
                    .table_name
                    .clone()
                    .unwrap_or_else(|| identifier.clone());
                Some(ConfigStore::new(storage, key))
            }
            _ => None,
        };

        let user_config = match &store {
            Some(store) => store.restore(defaults)?,
            None => defaults,
        };

        let mut table = Table {
            columns,
            table_columns: Vec::new(),
            data,
            rows: Vec::new(),
            identifier,
            user_config,
            store,
            options,
            selection: Selection::default(),
            custom_classes,
            observer,
            fetch_state: FetchState::Idle,
            pending: None,
            loading_indicator: false,
            loading_error: false,
        };

        table.apply_column_states();
        table.update_columns();
        table.persist()?;
        table.apply_filter();

        info!(
            table = table.storage_key().unwrap_or(&table.identifier),
            identifier = %table.identifier,
            columns = table.columns.len(),
            visible = table.table_columns.len(),
            "Table initialized"
        );

        Ok(table)
    }
}

fn first_visible(columns: &[Column]) -> &str {
    columns
        .iter()
        .find(|c| !c.is_hidden)
        .unwrap_or(&columns[0])
        .prop
        .as_str()
}

/// Parse user-typed page size text.
///
/// Leading whitespace, an optional sign and the leading digits are read;
/// anything below 1 (including text without digits) becomes 1.
pub fn parse_limit(text: &str) -> usize {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];

    if negative || digits.is_empty() {
        return 1;
    }
    digits.parse::<usize>().unwrap_or(usize::MAX).max(1)
}

/// An in-memory table: dataset, columns, user configuration and reload state.
pub struct Table {
    /// All declared columns, in declaration order
    columns: Vec<Column>,
    /// The visible subset of `columns`
    table_columns: Vec<Column>,
    /// Full dataset
    data: Vec<Row>,
    /// Indices into `data` of the visible rows
    rows: Vec<usize>,

    identifier: String,
    user_config: UserConfig,
    store: Option<ConfigStore>,
    options: TableOptions,

    selection: Selection,
    custom_classes: Option<CustomClasses>,
    observer: Arc<dyn TableObserver>,

    fetch_state: FetchState,
    pending: Option<Receiver<FetchOutcome>>,
    loading_indicator: bool,
    loading_error: bool,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("identifier", &self.identifier)
            .field("columns", &self.columns.len())
            .field("data", &self.data.len())
            .field("rows", &self.rows.len())
            .field("user_config", &self.user_config)
            .field("fetch_state", &self.fetch_state)
            .finish()
    }
}

impl Table {
    /// Start building a table over `columns`
    pub fn builder(columns: Vec<Column>) -> TableBuilder {
        TableBuilder {
            columns,
            options: TableOptions::default(),
            storage: None,
            observer: Arc::new(NoopObserver),
            custom_classes: None,
            data: Vec::new(),
        }
    }

    // === Accessors ===

    /// The unique row key
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The persistence key, if this table persists its configuration
    pub fn storage_key(&self) -> Option<&str> {
        self.store.as_ref().map(ConfigStore::key)
    }

    /// All declared columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The visible columns
    pub fn table_columns(&self) -> &[Column] {
        &self.table_columns
    }

    /// The full dataset
    pub fn data(&self) -> &[Row] {
        &self.data
    }

    /// The user configuration, equal to the persisted snapshot
    pub fn user_config(&self) -> &UserConfig {
        &self.user_config
    }

    pub fn search(&self) -> &str {
        &self.user_config.search
    }

    pub fn limit(&self) -> usize {
        self.user_config.limit
    }

    pub fn sorts(&self) -> &SortDefinition {
        &self.user_config.sorts
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    /// Whether a reload is in flight
    pub fn is_loading(&self) -> bool {
        self.loading_indicator
    }

    /// Whether the last reload failed visibly
    pub fn loading_error(&self) -> bool {
        self.loading_error
    }

    pub fn update_selection_on_refresh(&self) -> UpdateSelection {
        self.options.update_selection_on_refresh
    }

    pub fn set_update_selection_on_refresh(&mut self, policy: UpdateSelection) {
        self.options.update_selection_on_refresh = policy;
    }

    // === Rows ===

    /// Visible rows in dataset order
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().map(move |&i| &self.data[i])
    }

    /// Number of visible rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Visible rows ordered by the active sort definition
    pub fn sorted_rows(&self) -> Vec<&Row> {
        let mut indices = self.rows.clone();
        sort_indices(&mut indices, &self.data, &self.user_config.sorts);
        indices.into_iter().map(|i| &self.data[i]).collect()
    }

    /// Number of pages of `limit` rows
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.user_config.limit)
    }

    /// The `page`-th page (0-based) of sorted visible rows
    pub fn page(&self, page: usize) -> Vec<&Row> {
        let limit = self.user_config.limit;
        self.sorted_rows()
            .into_iter()
            .skip(page.saturating_mul(limit))
            .take(limit)
            .collect()
    }

    /// Replace the dataset wholesale and re-apply the current search
    pub fn set_data(&mut self, data: Vec<Row>) {
        self.data = data;
        self.apply_filter();
    }

    /// Show the full dataset, honouring the current search
    pub fn use_data(&mut self) {
        self.apply_filter();
    }

    // === Filtering ===

    /// Recompute the visible rows.
    ///
    /// With `restore`, the search is cleared and every row becomes visible.
    /// Otherwise the current search is tokenized and every token must match.
    ///
    /// Fails only if clearing the search could not be persisted; the rows
    /// are updated either way.
    #[instrument(skip(self), fields(search = %self.user_config.search))]
    pub fn update_filter(&mut self, restore: bool) -> Result<()> {
        if !restore {
            self.apply_filter();
            return Ok(());
        }

        self.rows = all_rows(&self.data);
        if self.user_config.search.is_empty() {
            return Ok(());
        }
        self.user_config.search.clear();
        self.persist()
    }

    /// Set the search text, refresh the visible rows and persist the search
    pub fn set_search(&mut self, search: impl Into<String>) -> Result<()> {
        let search = search.into();
        let changed = search != self.user_config.search;
        self.user_config.search = search;
        self.apply_filter();
        if changed {
            self.persist()?;
        }
        Ok(())
    }

    fn apply_filter(&mut self) {
        let query = SearchQuery::parse(&self.user_config.search);
        self.rows = filter_rows(
            &self.data,
            &query,
            &self.table_columns,
            self.options.parallel_threshold,
        );
        debug!(
            tokens = query.tokens().len(),
            visible = self.rows.len(),
            total = self.data.len(),
            "Filter applied"
        );
    }

    // === Columns ===

    /// Show or hide a column.
    ///
    /// Hiding the last visible column is refused. Returns true if the
    /// visibility changed.
    pub fn toggle_column(&mut self, prop: &str, visible: bool) -> Result<bool> {
        let hide = !visible;
        let Some(index) = self.columns.iter().position(|c| c.prop == prop) else {
            debug!(prop, "Toggle of unknown column ignored");
            return Ok(false);
        };

        if self.columns[index].is_hidden == hide {
            return Ok(false);
        }
        if hide && self.table_columns.len() <= 1 {
            debug!(prop, "Refusing to hide the last visible column");
            return Ok(false);
        }

        self.columns[index].is_hidden = hide;
        if let Some(state) = self.user_config.columns.iter_mut().find(|c| c.prop == prop) {
            state.is_hidden = hide;
        }

        self.update_columns();
        self.apply_filter();
        self.persist()?;
        Ok(true)
    }

    /// Copy the user configuration's visibility onto the columns, keeping at
    /// least one visible.
    fn apply_column_states(&mut self) {
        for column in &mut self.columns {
            column.is_hidden = self.user_config.is_hidden(&column.prop);
        }
        if self.columns.iter().all(|c| c.is_hidden) {
            let first = &mut self.columns[0];
            first.is_hidden = false;
            let prop = first.prop.clone();
            if let Some(state) = self.user_config.columns.iter_mut().find(|c| c.prop == prop) {
                state.is_hidden = false;
            }
        }
    }

    /// Recompute the visible columns and re-derive the sort if none of its
    /// columns is visible any more.
    fn update_columns(&mut self) {
        self.table_columns = self
            .columns
            .iter()
            .filter(|c| !c.is_hidden)
            .cloned()
            .collect();

        if !self.retain_visible_sorts() {
            let prop = first_visible(&self.columns).to_string();
            debug!(prop = %prop, "Sorted column hidden, re-deriving sort");
            self.user_config.sorts = create_sorting_definition(&prop);
        }
    }

    /// Drop sort keys on columns that are not visible. Returns false if no
    /// key is left.
    fn retain_visible_sorts(&mut self) -> bool {
        let visible = &self.table_columns;
        self.user_config
            .sorts
            .retain(|s| visible.iter().any(|c| c.prop == s.prop));
        !self.user_config.sorts.is_empty()
    }

    // === Sorting and paging ===

    /// Replace the sort definition.
    ///
    /// Keys on hidden or unknown columns are dropped; if none is left the
    /// default sort applies.
    pub fn set_sorts(&mut self, sorts: SortDefinition) -> Result<()> {
        self.user_config.sorts = sorts;
        if !self.retain_visible_sorts() {
            let prop = if self.table_columns.iter().any(|c| c.prop == self.identifier) {
                self.identifier.clone()
            } else {
                first_visible(&self.columns).to_string()
            };
            self.user_config.sorts = create_sorting_definition(&prop);
        }
        self.persist()
    }

    /// Set the page size from user-typed text; values below 1 become 1
    pub fn set_limit(&mut self, text: &str) -> Result<usize> {
        let limit = parse_limit(text);
        if limit.to_string() != text.trim() {
            debug!(input = text, limit, "Limit clamped");
        }
        self.user_config.limit = limit;
        self.persist()?;
        Ok(limit)
    }

    // === Persistence ===

    /// Write the user configuration to the store.
    ///
    /// On failure the live configuration is kept and the error returned, so
    /// the caller knows the stored snapshot is stale.
    fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.persist(&self.user_config).map_err(|e| {
            warn!(table = store.key(), error = %e, "Failed to persist user configuration");
            e
        })
    }

    // === Reloading ===

    /// Ask `source` for fresh data.
    ///
    /// Returns false (and does nothing) while another reload is in flight.
    /// A source that reports synchronously is applied before returning.
    #[instrument(skip(self, source))]
    pub fn reload_data(&mut self, source: &dyn DataSource) -> bool {
        if self.fetch_state == FetchState::Loading {
            debug!("Reload suppressed, request already in flight");
            return false;
        }

        self.fetch_state = FetchState::Loading;
        self.loading_indicator = true;
        self.loading_error = false;

        let (context, receiver) = FetchContext::new();
        self.pending = Some(receiver);
        source.fetch(context);

        self.poll_fetch();
        true
    }

    /// Apply a reported fetch outcome, if one has arrived.
    ///
    /// Returns true if the reload settled.
    pub fn poll_fetch(&mut self) -> bool {
        let received = match self.pending.as_ref().map(Receiver::try_recv) {
            None | Some(Err(TryRecvError::Empty)) => return false,
            Some(Ok(outcome)) => Some(outcome),
            Some(Err(TryRecvError::Disconnected)) => None,
        };
        self.settle(received);
        true
    }

    /// Block up to `timeout` for the in-flight reload to report.
    ///
    /// Returns true if the reload settled.
    pub fn wait_fetch(&mut self, timeout: Duration) -> bool {
        let received = match self.pending.as_ref().map(|r| r.recv_timeout(timeout)) {
            None | Some(Err(RecvTimeoutError::Timeout)) => return false,
            Some(Ok(outcome)) => Some(outcome),
            Some(Err(RecvTimeoutError::Disconnected)) => None,
        };
        self.settle(received);
        true
    }

    fn settle(&mut self, outcome: Option<FetchOutcome>) {
        self.pending = None;

        match outcome {
            Some(FetchOutcome::Loaded(rows)) => {
                info!(rows = rows.len(), "Reload complete");
                self.set_data(rows);
                self.update_selected();
            }
            Some(FetchOutcome::Failed(config)) => self.fetch_failed(config),
            None => warn!("Fetch context dropped without reporting"),
        }

        self.fetch_state = FetchState::Idle;
        self.loading_indicator = false;
    }

    fn fetch_failed(&mut self, config: FetchErrorConfig) {
        warn!(
            reset_data = config.reset_data,
            display_error = config.display_error,
            "Reload failed"
        );
        if config.reset_data {
            self.data.clear();
            self.rows.clear();
        }
        if config.display_error {
            self.loading_error = true;
            self.observer.on_event(TableEvent::LoadingFailed);
        }
    }

    // === Selection ===

    /// Replace the selection and fire the selection callback
    pub fn select(&mut self, rows: Vec<Row>) {
        self.selection = Selection::new(rows);
        self.on_select();
    }

    /// Re-derive the selection from the current dataset per policy
    pub fn update_selected(&mut self) {
        let policy = self.options.update_selection_on_refresh;
        if let Some(refreshed) = reconcile(policy, &self.selection, &self.data, &self.identifier) {
            debug!(policy = %policy, selected = refreshed.len(), "Selection refreshed");
            self.selection.selected = refreshed;
            self.on_select();
        }
    }

    fn on_select(&self) {
        self.observer
            .on_event(TableEvent::SelectionChanged(self.selection.selected.clone()));
    }

    // === Custom classes ===

    /// Space-joined custom classes for a cell value.
    ///
    /// Fails if the table has no custom classes configured.
    pub fn use_custom_class(&self, value: &CellValue) -> Result<Option<String>> {
        let classes = self
            .custom_classes
            .as_ref()
            .ok_or(TabulaError::CustomClassesNotSet)?;
        Ok(classes.classes_for(value))
    }
}
