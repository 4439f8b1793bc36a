//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use contacts_core::{Address, Contact, TypedValue};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single contact
    pub fn print_contact(&self, contact: &Contact) {
        match self.format {
            OutputFormat::Human => {
                for line in contact_details(contact) {
                    println!("{}", line);
                }
            }
            OutputFormat::Json => {
                println!("{}", to_json(contact));
            }
            OutputFormat::Quiet => {
                println!("{}", contact.uid);
            }
        }
    }

    /// Print a list of contacts
    pub fn print_contacts(&self, contacts: &[Contact]) {
        match self.format {
            OutputFormat::Human => {
                if contacts.is_empty() {
                    println!("No match.");
                    return;
                }
                for line in contact_table(contacts) {
                    println!("{}", line);
                }
                println!("\n{} contact(s)", contacts.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(&contacts));
            }
            OutputFormat::Quiet => {
                for contact in contacts {
                    println!("{}", contact.uid);
                }
            }
        }
    }

    /// Print contacts as mail client alias lines
    ///
    /// The line format is the same in every output mode.
    pub fn print_sup(&self, contacts: &[Contact]) {
        for line in sup_lines(contacts) {
            println!("{}", line);
        }
    }

    /// Print a list of categories
    pub fn print_categories(&self, categories: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if categories.is_empty() {
                    println!("No categories found.");
                    return;
                }
                for (name, count) in categories {
                    println!("{} ({})", name, count);
                }
                println!("\n{} categorie(s)", categories.len());
            }
            OutputFormat::Json => {
                let json_categories: Vec<_> = categories
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                println!("{}", to_json(&json_categories));
            }
            OutputFormat::Quiet => {
                for (name, _) in categories {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Detail lines for one contact
fn contact_details(contact: &Contact) -> Vec<String> {
    let mut lines = vec![format!("Name:         {}", contact.display_name())];

    let mut field = |label: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(format!("{:<13} {}", format!("{}:", label), value));
        }
    };
    field("Nickname", join(&contact.nicknames));
    field("Organization", contact.organization.clone());
    field("Title", contact.title.clone());
    field("Role", contact.role.clone());
    field("Birthday", contact.birthday.clone());
    field("Categories", join(&contact.categories));
    for email in &contact.emails {
        field("Email", Some(typed_value(email)));
    }
    for phone in &contact.phones {
        field("Phone", Some(typed_value(phone)));
    }
    for url in &contact.urls {
        field("URL", Some(typed_value(url)));
    }
    for address in &contact.addresses {
        field("Address", Some(address_summary(address)));
    }
    field("UID", Some(contact.uid.clone()));
    field("Revision", contact.revision.clone());

    if let Some(note) = contact.note.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(String::new());
        lines.push("── Note ──".to_string());
        lines.extend(note.lines().map(str::to_string));
    }
    lines
}

/// Table with a NAME, MAIL and PHONE column
fn contact_table(contacts: &[Contact]) -> Vec<String> {
    let rows: Vec<[String; 3]> = contacts
        .iter()
        .map(|c| {
            [
                truncate(&c.display_name(), 30),
                truncate(c.primary_email().unwrap_or(""), 35),
                truncate(c.primary_phone().unwrap_or(""), 20),
            ]
        })
        .collect();

    let mut widths = [4, 4, 5];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        )
        .trim_end()
        .to_string()
    };

    let mut lines = vec![format_row(["NAME", "MAIL", "PHONE"])];
    for row in &rows {
        lines.push(format_row([&row[0], &row[1], &row[2]]));
    }
    lines
}

/// `nick: Name <mail>` lines, for contacts that have all three
fn sup_lines(contacts: &[Contact]) -> Vec<String> {
    contacts
        .iter()
        .filter_map(|c| {
            let nick = c.primary_nickname()?;
            let name = c.display_name();
            let mail = c.primary_email()?;
            if name.is_empty() {
                return None;
            }
            Some(format!("{}: {} <{}>", nick, name, mail))
        })
        .collect()
}

fn join(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn typed_value(value: &TypedValue) -> String {
    if value.kinds.is_empty() {
        value.value.clone()
    } else {
        format!("{} ({})", value.value, value.kinds.join(", "))
    }
}

fn address_summary(address: &Address) -> String {
    let city = [address.postal_code.as_str(), address.locality.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let parts: Vec<&str> = [
        address.street.as_str(),
        city.as_str(),
        address.region.as_str(),
        address.country.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();

    let summary = parts.join(", ");
    if address.kinds.is_empty() {
        summary
    } else {
        format!("{} ({})", summary, address.kinds.join(", "))
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(given: &str, family: &str, nick: &str, mail: &str) -> Contact {
        let mut contact = Contact::new(given, family);
        if !nick.is_empty() {
            contact.nicknames = vec![nick.to_string()];
        }
        if !mail.is_empty() {
            contact.emails = vec![TypedValue::new(vec!["home".into()], mail)];
        }
        contact
    }

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ääääääääääää", 5), "ää...");
    }

    #[test]
    fn test_sup_lines_skip_incomplete() {
        let contacts = vec![
            contact("Ann", "Lee", "annie", "ann@example.com"),
            contact("Bob", "Jones", "", "bob@example.com"),
            contact("Cid", "", "cid", ""),
        ];
        assert_eq!(sup_lines(&contacts), vec!["annie: Ann Lee <ann@example.com>"]);
    }

    #[test]
    fn test_contact_table() {
        let mut bob = contact("Bob", "Jones", "", "");
        bob.phones = vec![TypedValue::new(vec![], "555")];
        let lines = contact_table(&[contact("Ann", "Lee", "", "ann@example.com"), bob]);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "NAME       MAIL             PHONE");
        assert_eq!(lines[1], "Ann Lee    ann@example.com");
        assert_eq!(lines[2], "Bob Jones                   555");
    }

    #[test]
    fn test_contact_details() {
        let mut ann = contact("Ann", "Lee", "annie", "ann@example.com");
        ann.uid = "abc123".into();
        ann.addresses = vec![Address {
            kinds: vec!["home".into()],
            street: "1 Main St".into(),
            locality: "Springfield".into(),
            postal_code: "62701".into(),
            ..Address::default()
        }];
        ann.note = Some("first\nsecond".into());

        let lines = contact_details(&ann);
        assert_eq!(lines[0], "Name:         Ann Lee");
        assert!(lines.contains(&"Nickname:     annie".to_string()));
        assert!(lines.contains(&"Email:        ann@example.com (home)".to_string()));
        assert!(lines.contains(&"Address:      1 Main St, 62701 Springfield (home)".to_string()));
        assert!(lines.contains(&"UID:          abc123".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("second"));
        assert!(!lines.iter().any(|l| l.starts_with("Title")));
    }
}
