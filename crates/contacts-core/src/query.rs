//! Match contacts against a search term and categories

use serde::{Deserialize, Serialize};

use crate::models::Contact;

/// A search over the address book
///
/// An empty term matches every contact, as does an empty category list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub term: String,
    pub categories: Vec<String>,
}

impl Query {
    pub fn new(term: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            term: term.into(),
            categories,
        }
    }

    pub fn term(term: impl Into<String>) -> Self {
        Self::new(term, Vec::new())
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        self.matches_categories(contact) && self.matches_term(contact)
    }

    fn matches_categories(&self, contact: &Contact) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        self.categories.iter().any(|wanted| {
            contact
                .categories
                .iter()
                .any(|category| category.to_lowercase() == wanted.to_lowercase())
        })
    }

    fn matches_term(&self, contact: &Contact) -> bool {
        let term = self.term.to_lowercase();
        if term.is_empty() {
            return true;
        }
        let contains = |value: &str| value.to_lowercase().contains(&term);

        contains(&contact.display_name())
            || contact.nicknames.iter().any(|n| contains(n))
            || contact.name.given.iter().any(|n| contains(n))
            || contact.name.family.iter().any(|n| contains(n))
            || contact.emails.iter().any(|e| contains(&e.value))
            || contact.phones.iter().any(|p| contains(&p.value))
    }

    /// Short description for messages
    pub fn describe(&self) -> String {
        match (self.term.is_empty(), self.categories.is_empty()) {
            (true, true) => "all contacts".to_string(),
            (false, true) => self.term.clone(),
            (true, false) => format!("categories {}", self.categories.join(", ")),
            (false, false) => format!(
                "{} in categories {}",
                self.term,
                self.categories.join(", ")
            ),
        }
    }
}
