//! Row selection and its reconciliation across reloads.

use crate::types::{cell, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

/// When to re-derive the selection after data is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateSelection {
    /// Fire only if the refreshed rows differ from the selected ones
    #[default]
    OnChange,
    /// Fire on every refresh
    Always,
    /// Keep the stale selection untouched
    Never,
}

impl fmt::Display for UpdateSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateSelection::OnChange => write!(f, "onChange"),
            UpdateSelection::Always => write!(f, "always"),
            UpdateSelection::Never => write!(f, "never"),
        }
    }
}

impl std::str::FromStr for UpdateSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onchange" | "on-change" | "on_change" => Ok(UpdateSelection::OnChange),
            "always" => Ok(UpdateSelection::Always),
            "never" => Ok(UpdateSelection::Never),
            _ => Err(format!("Unknown selection update policy: {}", s)),
        }
    }
}

/// The currently selected rows (copies, not indices, so they survive reloads)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Vec<Row>,
}

impl Selection {
    pub fn new(selected: Vec<Row>) -> Self {
        Selection { selected }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// First selected row, if any
    pub fn first(&self) -> Option<&Row> {
        self.selected.first()
    }
}

/// Decide whether a refreshed dataset changes the selection.
///
/// Each selected row is looked up in `data` by its `identifier` cell.
/// Returns the rows the selection should be replaced with when the selection
/// callback has to fire, `None` otherwise.
pub fn reconcile(
    policy: UpdateSelection,
    selection: &Selection,
    data: &[Row],
    identifier: &str,
) -> Option<Vec<Row>> {
    if policy == UpdateSelection::Never {
        return None;
    }

    let refreshed: Vec<Row> = selection
        .selected
        .iter()
        .flat_map(|selected| {
            let key = cell(selected, identifier);
            data.iter()
                .filter(move |row| key.is_some() && cell(row, identifier) == key)
        })
        .cloned()
        .collect();

    if policy == UpdateSelection::OnChange && refreshed == selection.selected {
        return None;
    }

    Some(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn make_data(n: i32) -> Vec<Row> {
        (0..n)
            .map(|i| {
                let mut row = Row::new();
                row.insert("a".to_string(), CellValue::from(i));
                row.insert("b".to_string(), CellValue::from(i * 10));
                row
            })
            .collect()
    }

    #[test]
    fn test_never_does_not_fire() {
        let mut data = make_data(10);
        let selection = Selection::new(vec![data[1].clone()]);
        assert!(reconcile(UpdateSelection::Never, &selection, &data, "a").is_none());

        data[1].insert("d".to_string(), CellValue::from(true));
        assert!(reconcile(UpdateSelection::Never, &selection, &data, "a").is_none());
    }

    #[test]
    fn test_always_fires() {
        let data = make_data(10);
        let selection = Selection::new(vec![data[1].clone()]);
        assert_eq!(
            reconcile(UpdateSelection::Always, &selection, &data, "a"),
            Some(vec![data[1].clone()])
        );
    }

    #[test]
    fn test_on_change_fires_only_on_difference() {
        let mut data = make_data(10);
        let selection = Selection::new(vec![data[1].clone()]);
        assert!(reconcile(UpdateSelection::OnChange, &selection, &data, "a").is_none());

        data[1].insert("d".to_string(), CellValue::from(true));
        assert_eq!(
            reconcile(UpdateSelection::OnChange, &selection, &data, "a"),
            Some(vec![data[1].clone()])
        );
    }

    #[test]
    fn test_on_change_fires_when_row_disappears() {
        let data = make_data(10);
        let selection = Selection::new(vec![data[1].clone()]);
        let refreshed = make_data(1);
        assert_eq!(
            reconcile(UpdateSelection::OnChange, &selection, &refreshed, "a"),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_empty_selection_is_stable() {
        let data = make_data(3);
        assert!(reconcile(UpdateSelection::OnChange, &Selection::default(), &data, "a").is_none());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("onChange".parse::<UpdateSelection>(), Ok(UpdateSelection::OnChange));
        assert_eq!("ALWAYS".parse::<UpdateSelection>(), Ok(UpdateSelection::Always));
        assert_eq!(UpdateSelection::Never.to_string(), "never");
        assert_eq!(
            serde_json::to_string(&UpdateSelection::OnChange).unwrap(),
            r#""onChange""#
        );
    }
}
