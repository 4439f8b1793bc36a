//! Render a contact as an editable text document

use std::fmt::Write;

use super::patterns::{NameField, Section};
use crate::models::{Address, Contact, TypedValue};

/// Render the contact into the document the user edits
///
/// Absent fields are left out, but every section heading is always
/// written so the parser finds the same boundaries on every pass.
/// The notes section comes last; its lines are written verbatim.
pub fn render(contact: &Contact) -> String {
    let mut doc = String::new();

    let labels: Vec<&str> = NameField::ALL.iter().map(|f| f.label()).collect();
    let _ = writeln!(doc, "# Fields: {}", labels.join(", "));
    for field in NameField::ALL {
        if let Some(value) = name_value(contact, field) {
            let _ = writeln!(doc, "{}: {}", field.label(), value);
        }
    }

    for (section, values) in [
        (Section::Emails, &contact.emails),
        (Section::Phones, &contact.phones),
        (Section::Urls, &contact.urls),
    ] {
        open_section(&mut doc, section);
        for value in values {
            let _ = writeln!(doc, "{}", typed_value_line(value));
        }
    }

    open_section(&mut doc, Section::Addresses);
    for address in &contact.addresses {
        let _ = writeln!(doc, "{}", address_line(address));
    }

    open_section(&mut doc, Section::Notes);
    if let Some(note) = contact.note.as_deref().filter(|n| !n.is_empty()) {
        for line in note.lines() {
            let _ = writeln!(doc, "{}", line);
        }
    }

    doc
}

fn open_section(doc: &mut String, section: Section) {
    if let Some(heading) = section.heading() {
        let _ = write!(doc, "\n{}\n", heading);
    }
}

fn name_value(contact: &Contact, field: NameField) -> Option<String> {
    match field {
        NameField::Prefix => list(&contact.name.prefixes),
        NameField::FirstName => list(&contact.name.given),
        NameField::LastName => list(&contact.name.family),
        NameField::Nick => list(&contact.nicknames),
        NameField::Title => single(contact.title.as_deref()),
        NameField::Role => single(contact.role.as_deref()),
        NameField::Organization => single(contact.organization.as_deref()),
        NameField::Categories => list(&contact.categories),
        NameField::Birthday => single(contact.birthday.as_deref()),
    }
}

fn list(values: &[String]) -> Option<String> {
    let joined = one_line(&values.join(", "));
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn single(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(one_line)
}

/// Everything outside the notes is one line per value
fn one_line(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn typed_value_line(value: &TypedValue) -> String {
    format!("{}: {}", value.kinds.join(", "), one_line(&value.value))
}

// label, post office box and extended address are not editable here
fn address_line(address: &Address) -> String {
    format!(
        "{}: ; ; {}; {}; {}; {}; {}",
        address.kinds.join(", "),
        one_line(&address.street),
        one_line(&address.locality),
        one_line(&address.region),
        one_line(&address.postal_code),
        one_line(&address.country)
    )
}
