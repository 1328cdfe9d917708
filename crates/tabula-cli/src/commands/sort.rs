//! Sort command - set the sort order.

use crate::app::App;
use crate::TableArgs;
use anyhow::{anyhow, bail};
use tabula_core::{Config, SortDefinition, SortDirection, SortProp, Table};

/// Parse `prop` or `prop:dir` into a sort key.
pub fn parse_sort_key(key: &str) -> anyhow::Result<SortProp> {
    let (prop, dir) = match key.rsplit_once(':') {
        Some((prop, dir)) => (prop, dir.parse::<SortDirection>().map_err(|e| anyhow!(e))?),
        None => (key, SortDirection::Asc),
    };
    if prop.is_empty() {
        bail!("Empty sort key: '{}'", key);
    }
    Ok(SortProp::new(prop, dir))
}

/// Reject sort keys on columns that are unknown or hidden.
pub fn check_sortable(table: &Table, sorts: &[SortProp]) -> anyhow::Result<()> {
    for sort in sorts {
        let Some(column) = table.columns().iter().find(|c| c.prop == sort.prop) else {
            bail!("Unknown column: '{}'", sort.prop);
        };
        if column.is_hidden {
            bail!("Column '{}' is hidden; show it before sorting on it", sort.prop);
        }
    }
    Ok(())
}

/// Run the sort command.
pub fn run(config: Config, args: &TableArgs, keys: &[String]) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let (mut table, _source) = app.open_table(args)?;

    let sorts = keys
        .iter()
        .map(|k| parse_sort_key(k))
        .collect::<anyhow::Result<SortDefinition>>()?;

    check_sortable(&table, &sorts)?;
    table.set_sorts(sorts)?;

    let described: Vec<String> = table
        .sorts()
        .iter()
        .map(|s| format!("{} ({})", s.prop, s.dir))
        .collect();
    println!("Sorted by {}", described.join(", "));

    Ok(())
}
