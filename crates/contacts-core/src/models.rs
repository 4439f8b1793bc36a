//! Data models for contacts
//!
//! Defines the core data structures: Contact, Name, TypedValue and Address.
//! Sequences are never optional: an absent property is an empty `Vec`, so
//! callers can iterate without checking.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp format used for revisions, e.g. `1995-10-31T22:27:10Z`
pub const REVISION_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A single contact, backed by one vCard file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    /// Stable identifier, empty until the contact is first saved
    pub uid: String,
    /// Timestamp of the last save
    pub revision: Option<String>,
    /// Display name (derived from the name if not set)
    pub formatted_name: Option<String>,
    /// Structured name
    pub name: Name,
    pub nicknames: Vec<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    /// ORG units as stored in the card, written back while `organization`
    /// still reads as their comma-joined form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organization_units: Vec<String>,
    /// Free-text tags
    pub categories: Vec<String>,
    /// Birthday in the card's native date representation
    pub birthday: Option<String>,
    pub emails: Vec<TypedValue>,
    pub phones: Vec<TypedValue>,
    pub urls: Vec<TypedValue>,
    pub addresses: Vec<Address>,
    /// Multi-line free text
    pub note: Option<String>,
    /// Unmodelled vCard content lines, preserved as-is
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

/// Structured name
///
/// `additional` and `suffixes` are carried through from the card but are
/// not part of the editable text document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Name {
    pub prefixes: Vec<String>,
    pub given: Vec<String>,
    pub family: Vec<String>,
    #[serde(default)]
    pub additional: Vec<String>,
    #[serde(default)]
    pub suffixes: Vec<String>,
}

/// A value (mail address, phone number, URL) tagged with kind labels
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedValue {
    /// Labels such as "home" or "work"
    pub kinds: Vec<String>,
    pub value: String,
    /// vCard group prefix, e.g. `item1`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Other vCard parameters, kept verbatim (`PREF=1`, `VALUE=uri`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl TypedValue {
    pub fn new(kinds: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            kinds,
            value: value.into(),
            ..Self::default()
        }
    }

    /// A typed value is only meaningful with a non-empty value
    pub fn is_valid(&self) -> bool {
        !self.value.is_empty()
    }
}

/// A postal address
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub kinds: Vec<String>,
    pub label: String,
    pub post_office_box: String,
    pub extended_address: String,
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Address {
    /// Whether street, locality, region, postal code and country all match
    pub fn same_place(&self, other: &Address) -> bool {
        self.street == other.street
            && self.locality == other.locality
            && self.region == other.region
            && self.postal_code == other.postal_code
            && self.country == other.country
    }
}

impl Contact {
    /// Create an unsaved contact with the given first and last name
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        let mut contact = Self::default();
        contact.name.given = non_empty(given.into());
        contact.name.family = non_empty(family.into());
        contact
    }

    /// Whether this contact has never been saved
    pub fn is_new(&self) -> bool {
        self.uid.is_empty()
    }

    /// Assign a fresh uid if none is set
    ///
    /// Returns `true` if a uid was assigned.
    pub fn ensure_uid(&mut self) -> bool {
        if self.uid.is_empty() {
            self.uid = Uuid::new_v4().to_string();
            true
        } else {
            false
        }
    }

    /// Stamp the revision with the current UTC time
    pub fn touch(&mut self) {
        self.revision = Some(Utc::now().format(REVISION_FORMAT).to_string());
    }

    /// The name to show for this contact
    ///
    /// Uses the formatted name if set, otherwise the first given name and
    /// the first family name.
    pub fn display_name(&self) -> String {
        if let Some(formatted) = self.formatted_name.as_deref() {
            if !formatted.trim().is_empty() {
                return formatted.trim().to_string();
            }
        }
        let given = self.name.given.first().map(String::as_str).unwrap_or("");
        let family = self.name.family.first().map(String::as_str).unwrap_or("");
        format!("{} {}", given, family).trim().to_string()
    }

    /// Recompute the formatted name from the structured name
    pub fn refresh_formatted_name(&mut self) {
        let name = self.display_name();
        self.formatted_name = if name.is_empty() { None } else { Some(name) };
    }

    /// First non-empty mail address
    pub fn primary_email(&self) -> Option<&str> {
        first_valid(&self.emails)
    }

    /// First non-empty phone number
    pub fn primary_phone(&self) -> Option<&str> {
        first_valid(&self.phones)
    }

    /// First non-empty nickname
    pub fn primary_nickname(&self) -> Option<&str> {
        self.nicknames
            .iter()
            .map(|n| n.trim())
            .find(|n| !n.is_empty())
    }
}

/// Sort contacts by display name
pub fn sort_by_name(contacts: &mut [Contact]) {
    contacts.sort_by_cached_key(|c| c.display_name());
}

fn first_valid(values: &[TypedValue]) -> Option<&str> {
    values
        .iter()
        .find(|v| v.is_valid())
        .map(|v| v.value.as_str())
}

fn non_empty(value: String) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}
