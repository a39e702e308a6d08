//! Credential store seam. The storefront keeps stored values in a
//! `password_hash` column; here the seam is a trait so the login glue never
//! cares where the text lives. `JsonCredentialStore` backs the CLI and tests
//! with a single JSON document.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::Realm;

const STORE_TARGET: &str = "tealeaf::store";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unreadable: {0}")]
    Io(String),
    #[error("credential store parse failed: {0}")]
    Parse(String),
}

/// Persistence for stored credential values, keyed by realm and account.
pub trait CredentialStore {
    fn load(&self, realm: Realm, account: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, realm: Realm, account: &str, stored: &str) -> Result<(), StoreError>;
    /// Returns `true` when an entry was present.
    fn remove(&self, realm: Realm, account: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    admins: BTreeMap<String, String>,
    #[serde(default)]
    customers: BTreeMap<String, String>,
}

impl StoreDocument {
    fn realm(&self, realm: Realm) -> &BTreeMap<String, String> {
        match realm {
            Realm::Admin => &self.admins,
            Realm::Customer => &self.customers,
        }
    }

    fn realm_mut(&mut self, realm: Realm) -> &mut BTreeMap<String, String> {
        match realm {
            Realm::Admin => &mut self.admins,
            Realm::Customer => &mut self.customers,
        }
    }
}

/// Exclusive lock on the sidecar `<store>.lock` file, released on drop.
/// The document itself is replaced by rename, so it cannot carry the lock.
struct WriteLock {
    file: File,
}

impl WriteLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// File-backed store. A missing file reads as empty. Writers serialize on an
/// OS file lock, so separate instances and processes can share one path.
/// Each write goes to its own temp file which is renamed over the document,
/// so readers never see a partial write.
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreDocument::default()),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::Parse(format!("{e}")))
    }

    fn write_document(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_vec_pretty(document).map_err(|e| StoreError::Parse(format!("{e}")))?;
        let dir = self.parent_dir();
        let io_err = |e: std::io::Error| StoreError::Io(format!("{}: {e}", dir.display()));

        let mut staging = NamedTempFile::new_in(dir).map_err(io_err)?;
        staging.write_all(&encoded).map_err(io_err)?;
        staging.as_file().sync_all().map_err(io_err)?;
        staging
            .persist(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e.error)))?;
        Ok(())
    }

    /// Read-modify-write under the store's file lock. `apply` reports whether
    /// the document changed and needs writing back.
    fn update<T>(
        &self,
        apply: impl FnOnce(&mut StoreDocument) -> (T, bool),
    ) -> Result<T, StoreError> {
        let _lock = WriteLock::acquire(&self.lock_path())?;
        let mut document = self.read_document()?;
        let (result, changed) = apply(&mut document);
        if changed {
            self.write_document(&document)?;
        }
        Ok(result)
    }
}

impl CredentialStore for JsonCredentialStore {
    fn load(&self, realm: Realm, account: &str) -> Result<Option<String>, StoreError> {
        let document = self.read_document()?;
        Ok(document.realm(realm).get(account).cloned())
    }

    fn save(&self, realm: Realm, account: &str, stored: &str) -> Result<(), StoreError> {
        self.update(|document| {
            document
                .realm_mut(realm)
                .insert(account.to_string(), stored.to_string());
            ((), true)
        })?;
        tracing::debug!(target: STORE_TARGET, realm = realm.as_str(), account, "credential saved");
        Ok(())
    }

    fn remove(&self, realm: Realm, account: &str) -> Result<bool, StoreError> {
        let removed = self.update(|document| {
            let removed = document.realm_mut(realm).remove(account).is_some();
            (removed, removed)
        })?;
        if removed {
            tracing::debug!(target: STORE_TARGET, realm = realm.as_str(), account, "credential removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialStore, JsonCredentialStore, StoreError};
    use crate::accounts::Realm;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().expect("temp dir");
        let store = JsonCredentialStore::new(dir.path().join("credentials.json"));
        assert_eq!(store.load(Realm::Admin, "root").expect("load should work"), None);
        assert!(!store.remove(Realm::Admin, "root").expect("remove should work"));
    }

    #[test]
    fn realms_are_separate_namespaces() {
        let dir = tempdir().expect("temp dir");
        let store = JsonCredentialStore::new(dir.path().join("credentials.json"));
        store.save(Realm::Admin, "mei", "admin-value").expect("save should work");
        store.save(Realm::Customer, "mei", "customer-value").expect("save should work");

        assert_eq!(store.load(Realm::Admin, "mei").unwrap().as_deref(), Some("admin-value"));
        assert_eq!(store.load(Realm::Customer, "mei").unwrap().as_deref(), Some("customer-value"));

        assert!(store.remove(Realm::Admin, "mei").expect("remove should work"));
        assert_eq!(store.load(Realm::Admin, "mei").unwrap(), None);
        assert_eq!(store.load(Realm::Customer, "mei").unwrap().as_deref(), Some("customer-value"));
    }

    #[test]
    fn persists_across_instances() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        JsonCredentialStore::new(&path)
            .save(Realm::Customer, "kenji", "value")
            .expect("save should work");

        let reopened = JsonCredentialStore::new(&path);
        assert_eq!(reopened.load(Realm::Customer, "kenji").unwrap().as_deref(), Some("value"));

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["credentials.json", "credentials.json.lock"]);
    }

    #[test]
    fn separate_instances_do_not_lose_writes() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let path = path.clone();
                scope.spawn(move || {
                    let store = JsonCredentialStore::new(path);
                    for n in 0..25 {
                        store
                            .save(Realm::Customer, &format!("w{writer}-c{n}"), "value")
                            .expect("save should work");
                    }
                });
            }
        });

        let store = JsonCredentialStore::new(&path);
        for writer in 0..8 {
            for n in 0..25 {
                let account = format!("w{writer}-c{n}");
                assert!(
                    store.load(Realm::Customer, &account).unwrap().is_some(),
                    "{account} was lost"
                );
            }
        }
    }

    #[test]
    fn relative_paths_stage_in_the_working_directory() {
        let store = JsonCredentialStore::new("credentials.json");
        assert_eq!(store.parent_dir(), std::path::Path::new("."));
    }

    #[test]
    fn reports_corrupt_documents() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonCredentialStore::new(&path)
            .load(Realm::Admin, "root")
            .unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
