//! Detect whether an edited file changed
//!
//! A file is fingerprinted before it is handed to the editor and again
//! afterwards. Equal digests mean the user did not change anything.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 digest of a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(bytes));
        Self(digest)
    }

    pub fn of_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::of_bytes(&bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Remembers the fingerprint of a file before it is edited
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    before: Option<Fingerprint>,
}

impl ChangeDetector {
    /// Record the current state of the file
    ///
    /// An unreadable file leaves nothing to compare against, so any later
    /// check reports it as modified.
    pub fn capture(path: &Path) -> Self {
        let before = match Fingerprint::of_file(path) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                debug!("Could not fingerprint {}: {}", path.display(), e);
                None
            }
        };
        Self { before }
    }

    pub fn before(&self) -> Option<Fingerprint> {
        self.before
    }

    /// Whether the file differs from the captured state
    pub fn is_modified(&self, path: &Path) -> bool {
        let Some(before) = self.before else {
            return true;
        };
        match Fingerprint::of_file(path) {
            Ok(after) => after != before,
            Err(e) => {
                debug!("Could not fingerprint {}: {}", path.display(), e);
                true
            }
        }
    }
}
