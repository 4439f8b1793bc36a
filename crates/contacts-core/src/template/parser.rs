//! Read an edited text document back into a contact
//!
//! The document has no formal grammar. It is scanned line by line with a
//! small state machine, one state per section:
//!
//! - a heading line switches the section and empties its collection
//! - other lines starting with `#` are comments and skipped
//! - blank lines are skipped everywhere except in the notes
//! - every other line goes to the handler of the current section
//!
//! Lines a handler cannot make sense of are dropped. Nothing here fails on
//! bad input; dropped lines are listed in the returned [`ParseReport`] for
//! callers that want to show them.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use super::patterns::{NameField, Section, TemplatePatterns};
use crate::models::{Address, Contact, TypedValue};

/// A line the parser could not use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLine {
    /// 1-based line number in the document
    pub number: usize,
    /// Section that was active when the line was read
    pub section: Section,
    pub text: String,
}

/// Diagnostics from one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub dropped: Vec<DroppedLine>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Parser for the editable document
#[derive(Debug, Clone, Default)]
pub struct Parser {
    patterns: TemplatePatterns,
}

impl Parser {
    pub fn new(patterns: TemplatePatterns) -> Self {
        Self { patterns }
    }

    /// Parse a document into a new contact
    pub fn parse(&self, text: &str) -> Contact {
        let mut contact = Contact::default();
        self.parse_into(text, &mut contact);
        contact
    }

    /// Read an edited file into the contact
    ///
    /// Only reading the file can fail.
    pub fn parse_file(&self, path: &Path, contact: &mut Contact) -> io::Result<ParseReport> {
        let text = fs::read_to_string(path)?;
        Ok(self.parse_into(&text, contact))
    }

    /// Parse a document into an existing contact
    ///
    /// The document is authoritative for every field it can express: those
    /// fields are emptied first and filled from the text. Everything else
    /// (uid, revision, codec-only properties) is left alone. If the given or
    /// family names changed, the formatted name is dropped so that it is
    /// derived again on save. Values that come back unchanged keep their
    /// vCard group and parameters.
    pub fn parse_into(&self, text: &str, contact: &mut Contact) -> ParseReport {
        let previous_given = std::mem::take(&mut contact.name.given);
        let previous_family = std::mem::take(&mut contact.name.family);
        let previous_emails = std::mem::take(&mut contact.emails);
        let previous_phones = std::mem::take(&mut contact.phones);
        let previous_urls = std::mem::take(&mut contact.urls);
        let mut previous_addresses = std::mem::take(&mut contact.addresses);
        clear_editable(contact);

        let mut report = ParseReport::default();
        let mut note_lines: Vec<&str> = Vec::new();
        let mut state = Section::Names;

        for (index, line) in text.lines().enumerate() {
            if let Some(section) = self.patterns.heading(line) {
                reset_section(contact, &mut note_lines, section);
                state = section;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if state != Section::Notes && line.trim().is_empty() {
                continue;
            }

            let accepted = match state {
                Section::Names => self.parse_names(line, contact),
                Section::Emails => self.push_typed_value(line, &mut contact.emails),
                Section::Phones => self.push_typed_value(line, &mut contact.phones),
                Section::Urls => self.push_typed_value(line, &mut contact.urls),
                Section::Addresses => self.push_address(line, &mut contact.addresses),
                Section::Notes => {
                    note_lines.push(line);
                    true
                }
            };

            if !accepted {
                debug!("Dropped line {} in {:?}: {:?}", index + 1, state, line);
                report.dropped.push(DroppedLine {
                    number: index + 1,
                    section: state,
                    text: line.to_string(),
                });
            }
        }

        while note_lines.last().is_some_and(|l| l.trim().is_empty()) {
            note_lines.pop();
        }
        contact.note = if note_lines.is_empty() {
            None
        } else {
            Some(note_lines.join("\n"))
        };

        if contact.name.given != previous_given || contact.name.family != previous_family {
            contact.formatted_name = None;
        }

        keep_codec_fields(&mut contact.emails, previous_emails);
        keep_codec_fields(&mut contact.phones, previous_phones);
        keep_codec_fields(&mut contact.urls, previous_urls);
        for address in contact.addresses.iter_mut() {
            if let Some(index) = previous_addresses.iter().position(|p| p.same_place(address)) {
                let source = previous_addresses.swap_remove(index);
                address.group = source.group;
                address.params = source.params;
            }
        }

        report
    }

    fn parse_names(&self, line: &str, contact: &mut Contact) -> bool {
        let mut matched = false;
        for (field, value) in self.patterns.name_fields(line) {
            matched = true;
            let value = value.trim();
            match field {
                NameField::Prefix => contact.name.prefixes = multiple(value),
                NameField::FirstName => contact.name.given = multiple(value),
                NameField::LastName => contact.name.family = multiple(value),
                NameField::Nick => contact.nicknames = multiple(value),
                NameField::Categories => contact.categories = multiple(value),
                NameField::Title => contact.title = single(value),
                NameField::Role => contact.role = single(value),
                NameField::Organization => contact.organization = single(value),
                NameField::Birthday => contact.birthday = single(value),
            }
        }
        matched
    }

    fn push_typed_value(&self, line: &str, values: &mut Vec<TypedValue>) -> bool {
        match self.patterns.typed_value(line) {
            Some((kinds, value)) if !value.is_empty() => {
                values.push(TypedValue::new(kinds, value));
                true
            }
            _ => false,
        }
    }

    fn push_address(&self, line: &str, addresses: &mut Vec<Address>) -> bool {
        let Some((kinds, fields)) = self.patterns.address(line) else {
            return false;
        };
        // the first two fields are placeholders and never read back
        let [_, _, street, locality, region, postal_code, country] = fields;
        addresses.push(Address {
            kinds,
            street: street.to_string(),
            locality: locality.to_string(),
            region: region.to_string(),
            postal_code: postal_code.to_string(),
            country: country.to_string(),
            ..Address::default()
        });
        true
    }
}

fn clear_editable(contact: &mut Contact) {
    contact.name.prefixes.clear();
    contact.nicknames.clear();
    contact.categories.clear();
    contact.title = None;
    contact.role = None;
    contact.organization = None;
    contact.birthday = None;
    contact.emails.clear();
    contact.phones.clear();
    contact.urls.clear();
    contact.addresses.clear();
    contact.note = None;
}

fn reset_section<'a>(contact: &mut Contact, note_lines: &mut Vec<&'a str>, section: Section) {
    match section {
        Section::Names => {}
        Section::Emails => contact.emails.clear(),
        Section::Phones => contact.phones.clear(),
        Section::Urls => contact.urls.clear(),
        Section::Addresses => contact.addresses.clear(),
        Section::Notes => note_lines.clear(),
    }
}

/// Hand group and parameters over from the value each one was rendered from
fn keep_codec_fields(values: &mut [TypedValue], mut previous: Vec<TypedValue>) {
    for value in values.iter_mut() {
        if let Some(index) = previous.iter().position(|p| p.value == value.value) {
            let source = previous.swap_remove(index);
            value.group = source.group;
            value.params = source.params;
        }
    }
}

/// Comma separated values, trimmed, empty entries dropped
fn multiple(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn single(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
