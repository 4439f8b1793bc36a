//! Contacts Core Library
//!
//! This crate provides the core functionality for `contacts`, a command line
//! address book that keeps one vCard file per contact in a directory.
//!
//! # Architecture
//!
//! - **vCard files**: Source of truth, one `<uid>.vcf` per contact
//! - **Text template**: Contacts are edited as a plain text document that is
//!   parsed back after the editor exits
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = Store::open_with_config(&config);
//!
//! // Add a contact
//! let mut contact = Contact::new("Ann", "Lee");
//! store.save(&mut contact)?;
//!
//! // Query contacts
//! let found = store.find(&Query::term("lee"))?;
//! ```
//!
//! # Modules
//!
//! - `store`: Address book directory (main entry point)
//! - `models`: Contact data structures
//! - `vcard`: vCard 3.0 codec
//! - `template`: Editable text form of a contact
//! - `changes`: Fingerprints for detecting edits
//! - `edit`: Editor round trip
//! - `query`: Contact search
//! - `config`: Application configuration

pub mod changes;
pub mod config;
pub mod edit;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod template;
pub mod vcard;

pub use changes::{ChangeDetector, Fingerprint};
pub use config::Config;
pub use edit::{edit_contact, EditOutcome, EditorLauncher};
pub use error::{CodecError, EditError, StoreError, StoreResult};
pub use models::{sort_by_name, Address, Contact, Name, TypedValue};
pub use query::Query;
pub use store::Store;
pub use template::{render, ParseReport, Parser, TemplatePatterns};
