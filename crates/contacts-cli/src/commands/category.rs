//! Category command handlers

use anyhow::Result;

use contacts_core::Store;

use crate::output::Output;

/// List all categories with usage counts
pub fn list(store: &mut Store, output: &Output) -> Result<()> {
    let categories = store.categories_with_counts()?;
    output.print_categories(&categories);
    Ok(())
}
