//! Label and heading patterns shared by the projector and the parser
//!
//! The strings here are the contract between the rendered document and the
//! parser: they must match verbatim (case-sensitive).

use regex::Regex;

pub const HEADING_EMAILS: &str = "# Mail Adresses";
pub const HEADING_PHONES: &str = "# Phone Numbers";
pub const HEADING_URLS: &str = "# URLs";
pub const HEADING_ADDRESSES: &str = "# Postal Addresses";
pub const HEADING_NOTES: &str = "# Notes";

/// Single-valued and multi-valued fields of the names block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Prefix,
    FirstName,
    LastName,
    Nick,
    Title,
    Role,
    Organization,
    Categories,
    Birthday,
}

impl NameField {
    /// All fields in document order
    pub const ALL: [NameField; 9] = [
        NameField::Prefix,
        NameField::FirstName,
        NameField::LastName,
        NameField::Nick,
        NameField::Title,
        NameField::Role,
        NameField::Organization,
        NameField::Categories,
        NameField::Birthday,
    ];

    /// The label as it appears in the document
    pub fn label(self) -> &'static str {
        match self {
            NameField::Prefix => "Prefix",
            NameField::FirstName => "First Name",
            NameField::LastName => "Last Name",
            NameField::Nick => "Nick",
            NameField::Title => "Title",
            NameField::Role => "Role",
            NameField::Organization => "Organization",
            NameField::Categories => "Categories",
            NameField::Birthday => "Birthday",
        }
    }

    /// Whether the value is a comma separated list
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            NameField::Prefix
                | NameField::FirstName
                | NameField::LastName
                | NameField::Nick
                | NameField::Categories
        )
    }
}

/// Sections of the document, in the order they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Names,
    Emails,
    Phones,
    Urls,
    Addresses,
    Notes,
}

impl Section {
    /// Heading line that opens the section (the names block has none)
    pub fn heading(self) -> Option<&'static str> {
        match self {
            Section::Names => None,
            Section::Emails => Some(HEADING_EMAILS),
            Section::Phones => Some(HEADING_PHONES),
            Section::Urls => Some(HEADING_URLS),
            Section::Addresses => Some(HEADING_ADDRESSES),
            Section::Notes => Some(HEADING_NOTES),
        }
    }
}

/// Compiled patterns for reading an edited document
///
/// Built once and handed to the parser; nothing here is global or mutable.
#[derive(Debug, Clone)]
pub struct TemplatePatterns {
    names: Vec<(NameField, Regex)>,
    typed_value: Regex,
    address: Regex,
    headings: Vec<(&'static str, Section)>,
}

impl TemplatePatterns {
    pub fn new() -> Self {
        let names = NameField::ALL
            .iter()
            .map(|&field| (field, label_regex(field.label())))
            .collect();

        Self {
            names,
            // "<kind>[, <kind>...]: <value>", kinds may be left out
            typed_value: compile(r"^\s*(?:([A-Za-z][A-Za-z0-9_, -]*?)\s*)?:\s*(.*?)\s*$"),
            // "<kind>: <label>; <pobox>; street; locality; region; code; country"
            address: compile(
                r"^\s*(?:([A-Za-z][A-Za-z0-9_, -]*?)\s*)?:(.*?);(.*?);(.*?);(.*?);(.*?);(.*?);(.*?)$",
            ),
            headings: [
                Section::Emails,
                Section::Phones,
                Section::Urls,
                Section::Addresses,
                Section::Notes,
            ]
            .iter()
            .filter_map(|&section| section.heading().map(|h| (h, section)))
            .collect(),
        }
    }

    /// The section a heading line opens, if it is one
    pub fn heading(&self, line: &str) -> Option<Section> {
        let line = line.trim_end();
        self.headings
            .iter()
            .find(|(heading, _)| *heading == line)
            .map(|(_, section)| *section)
    }

    /// Every labelled field whose pattern matches the line, with its raw value
    pub fn name_fields<'a>(&'a self, line: &'a str) -> impl Iterator<Item = (NameField, &'a str)> + 'a {
        self.names.iter().filter_map(move |(field, regex)| {
            regex
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|value| (*field, value.as_str()))
        })
    }

    /// Split a typed value line into kinds and value
    pub fn typed_value<'a>(&self, line: &'a str) -> Option<(Vec<String>, &'a str)> {
        let caps = self.typed_value.captures(line)?;
        let kinds = caps.get(1).map(|m| parse_kinds(m.as_str())).unwrap_or_default();
        let value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        Some((kinds, value))
    }

    /// Split an address line into kinds and its seven fields
    pub fn address<'a>(&self, line: &'a str) -> Option<(Vec<String>, [&'a str; 7])> {
        let caps = self.address.captures(line)?;
        let kinds = caps.get(1).map(|m| parse_kinds(m.as_str())).unwrap_or_default();
        let mut fields = [""; 7];
        for (index, field) in fields.iter_mut().enumerate() {
            *field = caps.get(index + 2).map(|m| m.as_str().trim()).unwrap_or("");
        }
        Some((kinds, fields))
    }
}

impl Default for TemplatePatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a comma separated kind label into lower-cased kinds
pub fn parse_kinds(kinds: &str) -> Vec<String> {
    kinds
        .split(',')
        .map(|kind| kind.trim().to_lowercase())
        .filter(|kind| !kind.is_empty())
        .collect()
}

/// Whether a kind can be written into the document and read back
///
/// Matches the kind alphabet of the typed value and address patterns: a
/// letter followed by letters, digits, `_`, `-` or spaces.
pub fn is_text_kind(kind: &str) -> bool {
    let mut chars = kind.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        && kind.trim() == kind
}

fn label_regex(label: &str) -> Regex {
    compile(&format!(r"^\s*{}\s*:(.*?)$", regex::escape(label)))
}

// Patterns are fixed at compile time, a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid template pattern")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_lookup() {
        let patterns = TemplatePatterns::new();
        assert_eq!(patterns.heading("# Mail Adresses"), Some(Section::Emails));
        assert_eq!(patterns.heading("# Notes  \r"), Some(Section::Notes));
        assert_eq!(patterns.heading("# notes"), None);
        assert_eq!(patterns.heading("# Mail Adresses (old)"), None);
    }

    #[test]
    fn test_name_fields_tolerate_whitespace() {
        let patterns = TemplatePatterns::new();
        let found: Vec<_> = patterns.name_fields("First Name  :  Ann").collect();
        assert_eq!(found, vec![(NameField::FirstName, "  Ann")]);

        let found: Vec<_> = patterns.name_fields("Firstname: Ann").collect();
        assert!(found.is_empty());
    }

    #[test]
    fn test_typed_value() {
        let patterns = TemplatePatterns::new();

        let (kinds, value) = patterns.typed_value("Home, WORK : ann@example.com").unwrap();
        assert_eq!(kinds, vec!["home", "work"]);
        assert_eq!(value, "ann@example.com");

        let (kinds, value) = patterns.typed_value("work: https://example.com/a:b").unwrap();
        assert_eq!(kinds, vec!["work"]);
        assert_eq!(value, "https://example.com/a:b");

        let (kinds, value) = patterns.typed_value(": +1 555 0100").unwrap();
        assert!(kinds.is_empty());
        assert_eq!(value, "+1 555 0100");

        let (kinds, value) = patterns.typed_value("X-Mobile, pager_2: 555").unwrap();
        assert_eq!(kinds, vec!["x-mobile", "pager_2"]);
        assert_eq!(value, "555");

        assert!(patterns.typed_value("no separator here").is_none());
        assert!(patterns.typed_value("1st: x").is_none());
        assert!(patterns.typed_value("x.odd: x").is_none());
    }

    #[test]
    fn test_address() {
        let patterns = TemplatePatterns::new();
        let (kinds, fields) = patterns
            .address("home: ; ; 1 Main St; Springfield; IL; 62701; USA")
            .unwrap();
        assert_eq!(kinds, vec!["home"]);
        assert_eq!(fields, ["", "", "1 Main St", "Springfield", "IL", "62701", "USA"]);

        let (kinds, _) = patterns
            .address("x-summer: ; ; 2 Beach Rd; Dune; ; ; ")
            .unwrap();
        assert_eq!(kinds, vec!["x-summer"]);

        assert!(patterns.address("home: 1 Main St, Springfield").is_none());
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(parse_kinds(" Home ,, Cell "), vec!["home", "cell"]);
        assert!(parse_kinds("").is_empty());
    }

    #[test]
    fn test_is_text_kind() {
        assert!(is_text_kind("home"));
        assert!(is_text_kind("x-mobile"));
        assert!(is_text_kind("x mobile 2"));
        assert!(!is_text_kind(""));
        assert!(!is_text_kind("2nd"));
        assert!(!is_text_kind("x.odd"));
        assert!(!is_text_kind("a:b"));
        assert!(!is_text_kind("home "));
    }
}
