//! Contact command handlers

use anyhow::{Context, Result};
use tracing::debug;

use contacts_core::{edit_contact, sort_by_name, Config, Contact, Parser, Query, Store};

use crate::cli::AddArgs;
use crate::editor::{choose, confirm, CommandLauncher};
use crate::output::Output;

/// Create a new contact
///
/// The contact is saved even if the editor left the template unchanged.
pub fn add(store: &mut Store, config: &Config, args: AddArgs, output: &Output) -> Result<()> {
    let mut contact = Contact::new(
        args.first.unwrap_or_default(),
        args.last.unwrap_or_default(),
    );
    if let Some(nick) = args.nick.filter(|n| !n.trim().is_empty()) {
        contact.nicknames = vec![nick.trim().to_string()];
    }

    if !args.no_edit {
        let launcher = CommandLauncher::from_config(config)?;
        let outcome = edit_contact(&launcher, &Parser::default(), &mut contact)
            .context("Failed to edit contact")?;
        debug!("New contact edited, modified={}", outcome.modified);
    }

    store.save(&mut contact).context("Failed to save contact")?;

    output.success(&format!("Created contact: {}", contact.display_name()));
    output.print_contact(&contact);

    Ok(())
}

/// List contacts matching the query, sorted by name
pub fn list(store: &mut Store, query: Query, sup: bool, output: &Output) -> Result<()> {
    let mut contacts = store.find(&query)?;
    sort_by_name(&mut contacts);

    if sup {
        output.print_sup(&contacts);
    } else {
        output.print_contacts(&contacts);
    }
    Ok(())
}

/// Show a single contact
pub fn show(store: &mut Store, query: Query, output: &Output) -> Result<()> {
    let contact = select_one(store, &query, output)?;
    output.print_contact(&contact);
    Ok(())
}

/// Edit a contact in the editor
pub fn edit(store: &mut Store, config: &Config, query: Query, output: &Output) -> Result<()> {
    let mut contact = select_one(store, &query, output)?;
    let launcher = CommandLauncher::from_config(config)?;

    let outcome = edit_contact(&launcher, &Parser::default(), &mut contact)
        .context("Failed to edit contact")?;
    if !outcome.modified {
        output.message("No changes.");
        return Ok(());
    }

    store.save(&mut contact).context("Failed to save contact")?;

    output.success(&format!("Updated contact: {}", contact.display_name()));
    Ok(())
}

/// Delete a contact
pub fn delete(store: &mut Store, query: Query, output: &Output) -> Result<()> {
    let contact = select_one(store, &query, output)?;

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete contact: {}", summary(&contact));
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(&contact).context("Failed to delete contact")?;

    output.success(&format!("Deleted contact: {}", contact.display_name()));

    Ok(())
}

/// Resolve the query to exactly one contact
///
/// Several matches are offered for selection; no match is an error.
fn select_one(store: &mut Store, query: &Query, output: &Output) -> Result<Contact> {
    let mut found = store.find_required(query)?;
    if found.len() == 1 {
        return Ok(found.remove(0));
    }

    sort_by_name(&mut found);
    if !output.should_prompt() {
        anyhow::bail!(
            "{} contacts match '{}'. Narrow the search to select one.",
            found.len(),
            query.describe()
        );
    }

    let entries: Vec<String> = found.iter().map(summary).collect();
    let index = choose("Select a contact", &entries)?;
    Ok(found.swap_remove(index))
}

/// One-line description used in prompts
fn summary(contact: &Contact) -> String {
    match contact.primary_email() {
        Some(mail) => format!("{} <{}>", contact.display_name(), mail),
        None => contact.display_name(),
    }
}
