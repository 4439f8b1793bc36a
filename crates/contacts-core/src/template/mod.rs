//! Editable text form of a contact
//!
//! [`render`] turns a contact into a plain text document and [`Parser`] reads
//! an edited document back. Both sides share the labels and headings in
//! [`patterns`], so a document rendered here parses back to the same fields.

pub mod parser;
pub mod patterns;
pub mod projector;

pub use parser::{DroppedLine, ParseReport, Parser};
pub use patterns::{NameField, Section, TemplatePatterns};
pub use projector::render;
