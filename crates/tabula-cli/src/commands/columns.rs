//! Columns command - show or hide columns.

use crate::app::App;
use crate::TableArgs;
use tabula_core::Config;

/// Run the columns command.
pub fn run(
    config: Config,
    args: &TableArgs,
    hide: Vec<String>,
    show: Vec<String>,
) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let (mut table, _source) = app.open_table(args)?;

    for prop in &show {
        if !table.toggle_column(prop, true)? {
            eprintln!("Column '{}' is unknown or already shown", prop);
        }
    }
    for prop in &hide {
        if !table.toggle_column(prop, false)? {
            eprintln!(
                "Column '{}' is unknown, already hidden or the last visible column",
                prop
            );
        }
    }

    for column in table.columns() {
        let marker = if column.is_hidden { " " } else { "x" };
        println!("[{}] {:<16} {}", marker, column.prop, column.name);
    }

    if let Some(sort) = table.sorts().first() {
        println!();
        println!("Sorted by {} ({})", sort.prop, sort.dir);
    }

    Ok(())
}
