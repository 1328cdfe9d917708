//! Core data types for Tabula.
//!
//! This module defines the row and column model shared by the query engine,
//! the configuration store and the table state machine. These types are:
//!
//! - **Serializable**: datasets and column definitions are plain JSON
//! - **Loosely typed**: a row is an open mapping, opaque except through columns

use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single row: column property name to cell value.
pub type Row = BTreeMap<String, CellValue>;

/// Look up a cell by property name.
pub fn cell<'a>(row: &'a Row, prop: &str) -> Option<&'a CellValue> {
    row.get(prop)
}

/// A column declaration.
///
/// `prop` is the unique key into each [`Row`]; `name` is the display label
/// that scoped search tokens are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Unique key into a row
    pub prop: String,

    /// Display label (may contain spaces and punctuation)
    pub name: String,

    /// Layout weight; derived at table initialization when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_grow: Option<u32>,

    /// Whether the column may be resized; defaults to false at initialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizeable: Option<bool>,

    /// Hidden columns are excluded from the table column set
    #[serde(default)]
    pub is_hidden: bool,
}

impl Column {
    /// Create a visible column
    pub fn new(prop: impl Into<String>, name: impl Into<String>) -> Self {
        Column {
            prop: prop.into(),
            name: name.into(),
            flex_grow: None,
            resizeable: None,
            is_hidden: false,
        }
    }

    /// Set the layout weight
    pub fn with_flex_grow(mut self, flex_grow: u32) -> Self {
        self.flex_grow = Some(flex_grow);
        self
    }

    /// Set whether the column is resizeable
    pub fn with_resizeable(mut self, resizeable: bool) -> Self {
        self.resizeable = Some(resizeable);
        self
    }

    /// Mark the column hidden
    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Lower-cased display name, used for scoped token lookup
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Build columns from the keys of a sample row, in the order given, using
/// each key as its label.
pub fn infer_columns<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<Column> {
    keys.into_iter().map(|k| Column::new(k, k)).collect()
}
