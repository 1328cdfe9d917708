//! Status command - show stored table configurations.

use crate::app::App;
use tabula_core::{Config, ConfigStorage, UserConfig};

/// Run the status command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;

    println!("Tabula Status");
    println!("=============");
    println!();

    let keys = app.storage.keys()?;
    if keys.is_empty() {
        println!("No stored table configurations. Run 'tabula query <dataset>' to create one.");
        return Ok(());
    }

    println!("Stored tables:");
    for key in &keys {
        let Some(json) = app.storage.get(key)? else {
            continue;
        };

        match UserConfig::from_json(&json) {
            Ok(user_config) => {
                let hidden: Vec<&str> = user_config
                    .columns
                    .iter()
                    .filter(|c| c.is_hidden)
                    .map(|c| c.prop.as_str())
                    .collect();
                let sorts: Vec<String> = user_config
                    .sorts
                    .iter()
                    .map(|s| format!("{} {}", s.prop, s.dir))
                    .collect();

                println!("  {}", key);
                println!("    Columns:  {} ({} hidden)", user_config.columns.len(), hidden.len());
                if !hidden.is_empty() {
                    println!("    Hidden:   {}", hidden.join(", "));
                }
                println!("    Sort:     {}", sorts.join(", "));
                println!("    Limit:    {}", user_config.limit);
                if !user_config.search.is_empty() {
                    println!("    Search:   {}", user_config.search);
                }
            }
            Err(e) => println!("  {} ⚠ unreadable: {}", key, e),
        }
    }

    // Show data directory
    println!();
    println!("Storage file: {}", app.storage.storage_path().display());

    Ok(())
}
