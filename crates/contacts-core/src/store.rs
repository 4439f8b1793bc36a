//! Directory-backed address book
//!
//! The `Store` owns a directory ("vdir") with one vCard file per contact,
//! named `<uid>.vcf`. The directory is scanned on first use, and again
//! whenever nothing is loaded, and kept in memory until
//! [`Store::invalidate`] is called.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open_with_config(&config);
//!
//! let mut contact = Contact::new("Ann", "Lee");
//! store.save(&mut contact)?;
//!
//! let found = store.find(&Query::term("lee"))?;
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::Contact;
use crate::query::Query;
use crate::vcard::{self, FILE_EXTENSION};

/// Address book backed by a directory of vCard files
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    /// Loaded contacts in file name order, `None` until the first scan
    contacts: Option<Vec<Contact>>,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            contacts: None,
        }
    }

    /// Open the address book named in the configuration
    pub fn open_with_config(config: &Config) -> Self {
        Self::new(config.addressbook.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_extension(&self) -> &'static str {
        FILE_EXTENSION
    }

    /// File that holds the contact
    ///
    /// Path separators in the uid are replaced so the file always lands
    /// inside the address book.
    pub fn path_for(&self, contact: &Contact) -> PathBuf {
        let name: String = contact
            .uid
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.{}", name, FILE_EXTENSION))
    }

    /// All contacts matching the query, in file name order
    pub fn find(&mut self, query: &Query) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts()?;
        Ok(contacts
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect())
    }

    /// Like [`Store::find`], but no match is an error
    pub fn find_required(&mut self, query: &Query) -> StoreResult<Vec<Contact>> {
        let found = self.find(query)?;
        if found.is_empty() {
            return Err(StoreError::NoMatch {
                query: query.describe(),
            });
        }
        Ok(found)
    }

    /// All loaded contacts, scanning the directory if needed
    ///
    /// An empty cache is rescanned, so files that appeared since the last
    /// lookup in an empty address book are picked up.
    pub fn contacts(&mut self) -> StoreResult<&[Contact]> {
        if self.contacts.as_ref().map_or(true, Vec::is_empty) {
            self.contacts = Some(self.scan()?);
        }
        Ok(self.contacts.as_deref().unwrap_or_default())
    }

    /// Write the contact to its file
    ///
    /// A new contact gets a uid first. The revision is stamped and the
    /// formatted name derived again before encoding.
    pub fn save(&mut self, contact: &mut Contact) -> StoreResult<()> {
        if contact.ensure_uid() {
            debug!("Assigned uid {}", contact.uid);
        }
        contact.touch();
        contact.refresh_formatted_name();

        let path = self.path_for(contact);
        atomic_write(&path, &vcard::encode(contact))?;
        info!("Saved '{}' to {}", contact.display_name(), path.display());

        if let Some(contacts) = self.contacts.as_mut() {
            match contacts.iter_mut().find(|c| c.uid == contact.uid) {
                Some(existing) => *existing = contact.clone(),
                None => contacts.push(contact.clone()),
            }
        }
        Ok(())
    }

    /// Remove the contact's file
    ///
    /// A contact without uid was never saved; nothing is removed.
    pub fn delete(&mut self, contact: &Contact) -> StoreResult<()> {
        if contact.uid.is_empty() {
            warn!(
                "Refusing to delete '{}': contact has no uid",
                contact.display_name()
            );
            return Ok(());
        }

        let path = self.path_for(contact);
        fs::remove_file(&path).map_err(|e| StoreError::from_io(e, path.clone()))?;
        info!("Deleted '{}' ({})", contact.display_name(), path.display());

        if let Some(contacts) = self.contacts.as_mut() {
            contacts.retain(|c| c.uid != contact.uid);
        }
        Ok(())
    }

    /// Distinct categories with the number of contacts using them
    ///
    /// Categories are grouped case-insensitively and shown with the first
    /// spelling seen. Sorted by name.
    pub fn categories_with_counts(&mut self) -> StoreResult<Vec<(String, usize)>> {
        let mut counts: HashMap<String, (String, usize)> = HashMap::new();

        for contact in self.contacts()? {
            let mut seen: Vec<String> = Vec::new();
            for category in &contact.categories {
                let key = category.to_lowercase();
                if seen.contains(&key) {
                    continue;
                }
                counts
                    .entry(key.clone())
                    .or_insert_with(|| (category.clone(), 0))
                    .1 += 1;
                seen.push(key);
            }
        }

        let mut result: Vec<(String, usize)> = counts.into_values().collect();
        result.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
        Ok(result)
    }

    /// Forget the loaded contacts; the next lookup scans again
    pub fn invalidate(&mut self) {
        self.contacts = None;
    }

    fn scan(&self) -> StoreResult<Vec<Contact>> {
        let metadata =
            fs::metadata(&self.dir).map_err(|e| StoreError::from_read(e, self.dir.clone()))?;
        if !metadata.is_dir() {
            return Err(StoreError::NotADirectory {
                path: self.dir.clone(),
            });
        }

        let entries =
            fs::read_dir(&self.dir).map_err(|e| StoreError::from_read(e, self.dir.clone()))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::from_read(e, self.dir.clone()))?
                .path();
            let is_card = path.extension().is_some_and(|ext| ext == FILE_EXTENSION);
            if is_card && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut contacts = Vec::with_capacity(paths.len());
        for path in paths {
            debug!("Loading {}", path.display());
            let bytes = fs::read(&path).map_err(|e| StoreError::from_read(e, path.clone()))?;
            let mut contact = vcard::decode(&bytes)
                .map_err(|source| StoreError::Decode {
                    path: path.clone(),
                    source,
                })?;
            if contact.uid.is_empty() {
                // UID is optional in vCard 3.0; the file name keeps save and
                // delete pointed at the same file
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    debug!("No UID in {}, using '{}'", path.display(), stem);
                    contact.uid = stem.to_string();
                }
            }
            contacts.push(contact);
        }

        info!(
            "Loaded {} contacts from {}",
            contacts.len(),
            self.dir.display()
        );
        Ok(contacts)
    }
}

/// Write data to a file atomically
///
/// The data goes to a temp file next to the target, which is synced and
/// then renamed over it. The directory is created if needed.
fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::from_io(e, temp_path));
    }

    fs::rename(&temp_path, path).map_err(|e| StoreError::from_io(e, path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use tempfile::TempDir;

    const ANN: &str = "BEGIN:VCARD\r\nVERSION:3.0\r\nUID:abc123\r\nN:Lee;Ann;;;\r\nEND:VCARD\r\n";

    fn store_with(files: &[(&str, &str)]) -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        let store = Store::new(temp_dir.path());
        (temp_dir, store)
    }

    #[test]
    fn test_find_scenario() {
        let (_dir, mut store) = store_with(&[("abc123.vcf", ANN)]);

        let found = store.find(&Query::term("lee")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "abc123");
        assert_eq!(found[0].name.given, vec!["Ann"]);
        assert_eq!(found[0].name.family, vec!["Lee"]);

        assert!(store.find(&Query::term("bob")).unwrap().is_empty());
    }

    #[test]
    fn test_find_required_no_match() {
        let (_dir, mut store) = store_with(&[("abc123.vcf", ANN)]);

        let err = store.find_required(&Query::term("bob")).unwrap_err();
        assert!(matches!(err, StoreError::NoMatch { .. }));
        assert_eq!(store.find_required(&Query::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_only_card_files_are_loaded() {
        let (dir, mut store) = store_with(&[
            ("abc123.vcf", ANN),
            ("notes.txt", "not a card"),
            ("abc123.tmp", "half written"),
        ]);
        fs::create_dir(dir.path().join("sub.vcf")).unwrap();

        assert_eq!(store.contacts().unwrap().len(), 1);
    }

    #[test]
    fn test_scan_order_is_by_file_name() {
        let bob = ANN.replace("abc123", "b").replace("Lee;Ann", "Jones;Bob");
        let ann = ANN.replace("abc123", "a");
        let (_dir, mut store) = store_with(&[("b.vcf", &bob), ("a.vcf", &ann)]);

        let uids: Vec<String> = store
            .find(&Query::all())
            .unwrap()
            .into_iter()
            .map(|c| c.uid)
            .collect();
        assert_eq!(uids, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_failure_aborts_load() {
        let (_dir, mut store) =
            store_with(&[("abc123.vcf", ANN), ("broken.vcf", "BEGIN:VCARD\r\nFN:x\r\n")]);

        let err = store.find(&Query::all()).unwrap_err();
        match err {
            StoreError::Decode { path, source } => {
                assert!(path.ends_with("broken.vcf"));
                assert_eq!(source, CodecError::MissingEnd);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.contacts.is_none());
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::new(temp_dir.path().join("missing"));

        let err = store.find(&Query::all()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_not_a_directory() {
        let (dir, _) = store_with(&[("file", "x")]);
        let mut store = Store::new(dir.path().join("file"));

        let err = store.find(&Query::all()).unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory { .. }));
    }

    #[test]
    fn test_save_new_contact() {
        let temp_dir = TempDir::new().unwrap();
        let book = temp_dir.path().join("book");
        let mut store = Store::new(&book);

        let mut contact = Contact::new("Ann", "Lee");
        store.save(&mut contact).unwrap();

        assert!(!contact.uid.is_empty());
        assert!(contact.revision.is_some());
        assert_eq!(contact.formatted_name.as_deref(), Some("Ann Lee"));

        let path = store.path_for(&contact);
        assert_eq!(path, book.join(format!("{}.vcf", contact.uid)));
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = store.find(&Query::term("ann")).unwrap();
        assert_eq!(loaded, vec![contact]);
    }

    #[test]
    fn test_save_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::new(temp_dir.path());

        let mut contact = Contact::new("Ann", "Lee");
        store.save(&mut contact).unwrap();
        let uid = contact.uid.clone();
        let first_revision = contact.revision.clone();

        store.save(&mut contact).unwrap();

        assert_eq!(contact.uid, uid);
        assert!(contact.revision >= first_revision);
        let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_save_updates_loaded_cache() {
        let (_dir, mut store) = store_with(&[("abc123.vcf", ANN)]);
        let mut ann = store.find(&Query::term("ann")).unwrap().remove(0);

        ann.nicknames = vec!["annie".into()];
        store.save(&mut ann).unwrap();
        let mut bob = Contact::new("Bob", "Jones");
        store.save(&mut bob).unwrap();

        let all = store.find(&Query::all()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].primary_nickname(), Some("annie"));
        assert_eq!(all[1].uid, bob.uid);

        store.invalidate();
        assert_eq!(store.find(&Query::term("annie")).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let (dir, mut store) = store_with(&[("abc123.vcf", ANN)]);
        let ann = store.find(&Query::term("ann")).unwrap().remove(0);

        store.delete(&ann).unwrap();

        assert!(!dir.path().join("abc123.vcf").exists());
        assert!(store.find(&Query::all()).unwrap().is_empty());

        let err = store.delete(&ann).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete_without_uid_is_noop() {
        let (dir, mut store) = store_with(&[("abc123.vcf", ANN)]);

        store.delete(&Contact::new("Ann", "Lee")).unwrap();

        assert!(dir.path().join("abc123.vcf").exists());
    }

    #[test]
    fn test_card_without_uid_takes_file_stem() {
        let card = "BEGIN:VCARD\r\nVERSION:3.0\r\nN:Lee;Ann;;;\r\nEND:VCARD\r\n";
        let (dir, mut store) = store_with(&[("abc.vcf", card)]);

        let mut ann = store.find(&Query::term("ann")).unwrap().remove(0);
        assert_eq!(ann.uid, "abc");
        assert_eq!(store.path_for(&ann), dir.path().join("abc.vcf"));

        ann.nicknames = vec!["annie".into()];
        store.save(&mut ann).unwrap();
        store.invalidate();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let found = store.find(&Query::term("ann")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, "abc");
        assert_eq!(found[0].primary_nickname(), Some("annie"));

        store.delete(&found[0]).unwrap();
        assert!(!dir.path().join("abc.vcf").exists());
    }

    #[test]
    fn test_empty_cache_is_rescanned() {
        let (dir, mut store) = store_with(&[]);
        assert!(store.find(&Query::all()).unwrap().is_empty());

        fs::write(dir.path().join("abc123.vcf"), ANN).unwrap();

        assert_eq!(store.find(&Query::term("lee")).unwrap().len(), 1);
    }

    #[test]
    fn test_path_for_sanitizes_uid() {
        let store = Store::new("/book");
        let mut contact = Contact::default();
        contact.uid = "a/b".into();
        assert_eq!(store.path_for(&contact), PathBuf::from("/book/a_b.vcf"));
    }

    #[test]
    fn test_categories_with_counts() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::new(temp_dir.path());

        for (given, categories) in [
            ("Ann", vec!["Work", "Friends"]),
            ("Bob", vec!["work", "WORK"]),
            ("Cid", vec![]),
        ] {
            let mut contact = Contact::new(given, "");
            contact.categories = categories.into_iter().map(String::from).collect();
            store.save(&mut contact).unwrap();
        }
        store.invalidate();

        let categories = store.categories_with_counts().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0], ("Friends".to_string(), 1));
        assert_eq!(categories[1].0.to_lowercase(), "work");
        assert_eq!(categories[1].1, 2);
    }
}
