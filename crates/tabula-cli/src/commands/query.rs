//! Query command - filter, sort and page a dataset.

use crate::app::App;
use crate::render::{format_table, rows_to_json};
use crate::{OutputFormat, TableArgs};
use std::time::Instant;
use tabula_core::Config;

/// Run the query command.
pub fn run(
    config: Config,
    args: &TableArgs,
    search: Option<String>,
    reset: bool,
    page: usize,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let (mut table, _source) = app.open_table(args)?;

    let start = Instant::now();
    if reset {
        table.update_filter(true)?;
    } else if let Some(search) = search {
        table.set_search(search)?;
    }
    let rows = table.page(page.saturating_sub(1));
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            print!("{}", format_table(table.table_columns(), &rows));

            eprintln!();
            if !table.search().is_empty() {
                eprintln!("Search: {}", table.search());
            }
            eprintln!(
                "Page {} of {} ({} of {} rows match) in {:.3}ms",
                page.max(1),
                table.page_count().max(1),
                table.row_count(),
                table.data().len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            let json = rows_to_json(table.table_columns(), &rows)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
