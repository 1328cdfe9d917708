//! Clear command - remove stored table configurations.

use std::io::{self, Write};
use tabula_core::{Config, ConfigStorage, FileStorage};

/// Run the clear command.
pub fn run(config: Config, table: Option<String>, skip_confirm: bool) -> anyhow::Result<()> {
    let data_dir = config.storage_dir()?;
    let storage = FileStorage::open(&data_dir)?;

    if !storage.exists() {
        println!("No stored configurations found. Nothing to clear.");
        return Ok(());
    }

    if let Some(ref key) = table {
        if storage.get(key)?.is_none() {
            println!("No stored configuration for table '{}'.", key);
            return Ok(());
        }
    }

    if !skip_confirm {
        let target = match &table {
            Some(key) => format!("the stored configuration of table '{}'", key),
            None => "all stored table configurations".to_string(),
        };
        print!("This will delete {}. Are you sure? [y/N] ", target);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    match table {
        Some(key) => {
            storage.remove(&key)?;
            println!("Configuration of table '{}' cleared.", key);
        }
        None => {
            storage.clear()?;
            println!("All table configurations cleared.");
        }
    }

    Ok(())
}
