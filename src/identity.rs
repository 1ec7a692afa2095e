//! Persistent per-installation identity.
//!
//! The service threads a conversation by an opaque `scammer_<8 base-36 chars>`
//! token. [`IdentityStore`] creates that token lazily, keeps it in an injected
//! [`IdentityStorage`] backend, and hands back the same value for as long as the
//! backend keeps it. When the backend cannot be used the store still produces
//! a token, but a fresh one on every call.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::{Error, Result};
use crate::observability::{IDENTITY_CREATED, IDENTITY_FALLBACKS};

/// Storage key the identity is kept under.
pub const IDENTITY_KEY: &str = "scammer_id";

/// Literal prefix of every generated identity.
pub const IDENTITY_PREFIX: &str = "scammer_";

const SUFFIX_LEN: usize = 8;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque token identifying one conversation thread to the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Generates a new random identity.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{IDENTITY_PREFIX}{suffix}"))
    }

    /// Parses a well-formed identity, returning `None` for anything else.
    pub fn parse(token: &str) -> Option<Self> {
        let identity = Self(token.to_string());
        identity.is_well_formed().then_some(identity)
    }

    /// Returns true if the token is `scammer_` followed by 8 lowercase base-36 chars.
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix(IDENTITY_PREFIX) {
            Some(suffix) => {
                suffix.len() == SUFFIX_LEN
                    && suffix
                        .bytes()
                        .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
            }
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

///////////////////////////////////////// Storage /////////////////////////////////////////

/// A persistent string key-value store.
pub trait IdentityStorage: Send {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: IdentityStorage + ?Sized> IdentityStorage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a small JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user location: `<data_dir>/honeypot-console/identity.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("honeypot-console").join("identity.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashMap::new());
            }
            Err(err) => {
                return Err(Error::storage(
                    format!("cannot read {}: {err}", self.path.display()),
                    Some(Box::new(err)),
                ));
            }
        };
        serde_json::from_str(&contents).map_err(|err| {
            Error::storage(
                format!("corrupt storage file {}: {err}", self.path.display()),
                Some(Box::new(err)),
            )
        })
    }
}

impl IdentityStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        // Write beside the live file and rename over it, so a torn write
        // never replaces a readable identity.
        let temp_path = self.temp_path();
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(&values)?;
            fs::write(&temp_path, json)?;
            fs::rename(&temp_path, &self.path)
        };
        write().map_err(|err| {
            Error::storage(
                format!("cannot write {}: {err}", self.path.display()),
                Some(Box::new(err)),
            )
        })
    }
}

///////////////////////////////////////// Store /////////////////////////////////////////

/// Owns the identity token and the backend it is persisted in.
pub struct IdentityStore<S: IdentityStorage> {
    storage: S,
}

impl<S: IdentityStorage> IdentityStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the stored identity, creating and persisting one if absent.
    ///
    /// Never fails: if the backend cannot be read or written, a freshly
    /// generated identity is returned and nothing is persisted.
    pub fn get_or_create(&mut self) -> SessionIdentity {
        match self.storage.get(IDENTITY_KEY) {
            Ok(Some(token)) if !token.is_empty() => return SessionIdentity(token),
            Ok(_) => {}
            Err(err) => {
                IDENTITY_FALLBACKS.click();
                tracing::warn!("identity storage unavailable, using ephemeral identity: {err}");
                return SessionIdentity::generate();
            }
        }

        let identity = SessionIdentity::generate();
        match self.storage.set(IDENTITY_KEY, identity.as_str()) {
            Ok(()) => {
                IDENTITY_CREATED.click();
                tracing::info!(identity = %identity, "created session identity");
            }
            Err(err) => {
                IDENTITY_FALLBACKS.click();
                tracing::warn!("cannot persist identity, using ephemeral identity: {err}");
            }
        }
        identity
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStorage {
        fail_reads: bool,
        writes: usize,
    }

    impl IdentityStorage for FailingStorage {
        fn get(&self, _: &str) -> Result<Option<String>> {
            if self.fail_reads {
                Err(Error::storage("storage disabled", None))
            } else {
                Ok(None)
            }
        }

        fn set(&mut self, _: &str, _: &str) -> Result<()> {
            self.writes += 1;
            Err(Error::storage("quota exceeded", None))
        }
    }

    /// Counts writes so the at-most-once property can be checked.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: usize,
    }

    impl IdentityStorage for CountingStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.writes += 1;
            self.inner.set(key, value)
        }
    }

    #[test]
    fn generated_identity_is_well_formed() {
        for _ in 0..100 {
            let identity = SessionIdentity::generate();
            assert!(identity.is_well_formed(), "{identity}");
            assert_eq!(identity.as_str().len(), IDENTITY_PREFIX.len() + SUFFIX_LEN);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(SessionIdentity::parse("scammer_0a1b2c3d").is_some());
        assert!(SessionIdentity::parse("scammer_0A1B2C3D").is_none());
        assert!(SessionIdentity::parse("scammer_123").is_none());
        assert!(SessionIdentity::parse("victim_0a1b2c3d").is_none());
        assert!(SessionIdentity::parse("scammer_0a1b2c3d9").is_none());
    }

    #[test]
    fn identity_is_stable_and_written_once() {
        let mut store = IdentityStore::new(CountingStorage::default());
        let first = store.get_or_create();
        let second = store.get_or_create();
        assert_eq!(first, second);
        assert!(first.is_well_formed());
        assert_eq!(store.storage().writes, 1);
    }

    #[test]
    fn existing_token_returned_unchanged() {
        let mut storage = MemoryStorage::new();
        storage.set(IDENTITY_KEY, "legacy-token").unwrap();
        let mut store = IdentityStore::new(storage);
        assert_eq!(store.get_or_create().as_str(), "legacy-token");
    }

    #[test]
    fn empty_token_is_replaced() {
        let mut storage = MemoryStorage::new();
        storage.set(IDENTITY_KEY, "").unwrap();
        let mut store = IdentityStore::new(storage);
        let identity = store.get_or_create();
        assert!(identity.is_well_formed());
        assert_eq!(
            store.storage().get(IDENTITY_KEY).unwrap().as_deref(),
            Some(identity.as_str())
        );
    }

    #[test]
    fn unreadable_storage_degrades_to_ephemeral() {
        let mut store = IdentityStore::new(FailingStorage {
            fail_reads: true,
            writes: 0,
        });
        let first = store.get_or_create();
        let second = store.get_or_create();
        assert!(first.is_well_formed());
        assert!(second.is_well_formed());
        assert_eq!(store.storage().writes, 0);
    }

    #[test]
    fn unwritable_storage_degrades_to_ephemeral() {
        let mut store = IdentityStore::new(FailingStorage {
            fail_reads: false,
            writes: 0,
        });
        assert!(store.get_or_create().is_well_formed());
        assert!(store.get_or_create().is_well_formed());
        assert_eq!(store.storage().writes, 2);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("identity.json");

        let first = IdentityStore::new(FileStorage::new(&path)).get_or_create();
        let second = IdentityStore::new(FileStorage::new(&path)).get_or_create();
        assert_eq!(first, second);
        assert!(path.exists());
    }

    #[test]
    fn file_storage_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        let mut storage = FileStorage::new(&path);
        storage.set(IDENTITY_KEY, "scammer_aaaaaaaa").unwrap();
        storage.set("other", "value").unwrap();

        assert!(!storage.temp_path().exists());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("identity.json")]);
        assert_eq!(
            storage.get(IDENTITY_KEY).unwrap().as_deref(),
            Some("scammer_aaaaaaaa")
        );
    }

    #[test]
    fn torn_write_does_not_clobber_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        let first = IdentityStore::new(FileStorage::new(&path)).get_or_create();

        // A write that died halfway leaves only a truncated temp file behind.
        let storage = FileStorage::new(&path);
        fs::write(storage.temp_path(), "{\"scammer_id\": \"scam").unwrap();

        let mut store = IdentityStore::new(storage);
        assert_eq!(store.get_or_create(), first);

        // The next successful write replaces the leftover.
        store.storage.set("other", "value").unwrap();
        assert!(!store.storage().temp_path().exists());
        assert_eq!(store.get_or_create(), first);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.get(IDENTITY_KEY).unwrap_err().is_storage());

        let mut store = IdentityStore::new(storage);
        assert!(store.get_or_create().is_well_formed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }
}
