//! # Tabula Core Library
//!
//! This crate provides the state machine behind an interactive data table:
//! free-text and column-scoped search, column visibility, sorting, paging,
//! persisted per-table user configuration, reload coordination and
//! selection reconciliation. Rendering is left to the embedder.
//!
//! ## Architecture
//!
//! - **Values** (`value`, `types`): Cell values, rows and column declarations
//! - **Search** (`tokenizer`, `search`, `filter`): Query parsing and matching
//! - **Sort** (`sort`): Sort definitions and row ordering
//! - **Persistence** (`storage`, `user_config`): Keyed storage of user configuration
//! - **Reloads** (`fetch`, `selection`, `events`): Data sources and selection updates
//! - **Table** (`table`): The state machine tying it together
//! - **Config** (`config`): Application configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use tabula_core::{Column, FetchContext, MemoryStorage, Table};
//!
//! let mut table = Table::builder(vec![Column::new("id", "ID"), Column::new("name", "Name")])
//!     .with_storage(Arc::new(MemoryStorage::new()))
//!     .build()?;
//!
//! table.reload_data(&|context: FetchContext| context.succeed(load_rows()));
//! table.set_search("name:web");
//! for row in table.page(0) {
//!     println!("{:?}", row);
//! }
//! ```

pub mod config;
pub mod custom_class;
pub mod dataset;
pub mod error;
pub mod events;
pub mod fetch;
pub mod filter;
pub mod search;
pub mod selection;
pub mod sort;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod types;
pub mod user_config;
pub mod value;

// Re-export commonly used types
pub use config::Config;
pub use custom_class::{ClassRule, CustomClasses};
pub use dataset::{Dataset, FileSource};
pub use error::{Result, TabulaError};
pub use events::{ChannelObserver, TableEvent, TableObserver};
pub use fetch::{DataSource, FetchContext, FetchErrorConfig, FetchOutcome, FetchState};
pub use search::{QueryToken, SearchQuery};
pub use selection::{Selection, UpdateSelection};
pub use sort::{create_sorting_definition, SortDefinition, SortDirection, SortProp};
pub use storage::{ConfigStorage, FileStorage, MemoryStorage};
pub use table::{Table, TableBuilder, TableOptions};
pub use tokenizer::tokenize;
pub use types::{Column, Row};
pub use user_config::{ColumnState, ConfigStore, UserConfig};
pub use value::CellValue;
