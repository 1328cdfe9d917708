//! Limit command - set the page size.

use crate::app::App;
use crate::TableArgs;
use tabula_core::Config;

/// Run the limit command.
pub fn run(config: Config, args: &TableArgs, value: &str) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let (mut table, _source) = app.open_table(args)?;

    let limit = table.set_limit(value)?;
    println!(
        "Page size set to {} ({} pages)",
        limit,
        table.page_count().max(1)
    );

    Ok(())
}
