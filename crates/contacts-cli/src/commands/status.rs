//! Status command handler

use std::path::Path;

use anyhow::Result;

use contacts_core::{Config, Store};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(store: &mut Store, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_file_path);
    let count = store.contacts()?.len();
    let categories = store.categories_with_counts()?.len();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "addressbook": store.dir(),
                    "file_extension": store.file_extension(),
                    "config_file": config_file,
                    "counts": {
                        "contacts": count,
                        "categories": categories
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", count);
        }
        OutputFormat::Human => {
            println!("Contacts Status");
            println!("===============");
            println!();
            println!("Address book:");
            println!("  Location: {}", store.dir().display());
            println!("  Files:    {} (*.{})", count, store.file_extension());
            println!();
            println!("Contents:");
            println!("  Contacts:   {}", count);
            println!("  Categories: {}", categories);
            println!();
            println!("Config file: {}", config_file.display());
        }
    }

    Ok(())
}
