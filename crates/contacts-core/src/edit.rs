//! Edit a contact in an external editor
//!
//! The contact is rendered to a temp file, the editor is launched on it,
//! and if the file changed it is parsed back into the contact. The temp file
//! is removed when this returns, whatever the outcome.

use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;
use tracing::debug;

use crate::changes::ChangeDetector;
use crate::error::EditError;
use crate::models::Contact;
use crate::template::{render, ParseReport, Parser};

/// Launches an editor on a file and waits for it to exit
pub trait EditorLauncher {
    fn launch(&self, path: &Path) -> io::Result<()>;
}

/// Result of an edit round trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Whether the user changed the document
    pub modified: bool,
    /// Lines the parser dropped (empty when unmodified)
    pub report: ParseReport,
}

/// Let the user edit the contact as text
///
/// An unmodified document leaves the contact untouched.
pub fn edit_contact(
    launcher: &dyn EditorLauncher,
    parser: &Parser,
    contact: &mut Contact,
) -> Result<EditOutcome, EditError> {
    let mut file = Builder::new()
        .prefix("edit-card-")
        .suffix(".txt")
        .tempfile()
        .map_err(EditError::TempFile)?;
    let path = file.path().to_path_buf();

    file.write_all(render(contact).as_bytes())
        .and_then(|_| file.flush())
        .map_err(|source| EditError::Write {
            path: path.clone(),
            source,
        })?;

    let detector = ChangeDetector::capture(&path);
    debug!("Launching editor on {}", path.display());
    launcher.launch(&path).map_err(EditError::Editor)?;

    if !detector.is_modified(&path) {
        debug!("Document for '{}' unchanged", contact.display_name());
        return Ok(EditOutcome::default());
    }

    let report = parser
        .parse_file(&path, contact)
        .map_err(|source| EditError::Read { path, source })?;
    for line in &report.dropped {
        debug!(
            "Ignored line {} in {:?}: {:?}",
            line.number, line.section, line.text
        );
    }

    Ok(EditOutcome {
        modified: true,
        report,
    })
}
