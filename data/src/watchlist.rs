use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Key the whole watchlist document is stored under
pub const STORAGE_KEY: &str = "watchlists";

/// Key-value storage the watchlists are written through
pub trait Persistence {
    fn load(&self, key: &str) -> Option<String>;
    fn store(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key inside a folder
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new(crate::data_path(None))
    }
}

impl Persistence for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {e}", self.path(key).display());
                None
            }
        }
    }

    fn store(&mut self, key: &str, value: &str) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path(key), value)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A watchlist named \"{0}\" already exists")]
    DuplicateName(String),
    #[error("Watchlist name can't be empty")]
    EmptyName,
    #[error("Failed to persist watchlists: {0}")]
    Persist(#[from] io::Error),
    #[error("Failed to serialize watchlists: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
struct Document {
    #[serde(default)]
    watchlists: BTreeMap<String, Vec<String>>,
}

/// Named ticker lists, every mutation is written through before it is kept
#[derive(Debug)]
pub struct WatchlistStore<P: Persistence> {
    storage: P,
    doc: Document,
}

impl<P: Persistence> WatchlistStore<P> {
    /// Reads the stored document, a missing or corrupt one starts empty
    pub fn load(storage: P) -> Self {
        let doc = match storage.load(STORAGE_KEY) {
            None => Document::default(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt watchlist document: {e}");
                Document::default()
            }),
        };

        log::debug!("Loaded {} watchlists", doc.watchlists.len());

        Self { storage, doc }
    }

    /// Watchlist names in sorted order
    pub fn list(&self) -> Vec<&str> {
        self.doc.watchlists.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.doc.watchlists.get(name.trim()).map(Vec::as_slice)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.doc.watchlists.contains_key(name.trim())
    }

    /// Adds an empty watchlist
    pub fn create(&mut self, name: &str) -> Result<(), Error> {
        let name = valid_name(name)?;
        if self.doc.watchlists.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let mut next = self.doc.clone();
        next.watchlists.insert(name.to_string(), vec![]);
        self.commit(next)
    }

    /// Overwrites the tickers of `name`, creating it when missing
    pub fn replace(&mut self, name: &str, tickers: Vec<String>) -> Result<(), Error> {
        let name = valid_name(name)?;

        let mut next = self.doc.clone();
        next.watchlists.insert(name.to_string(), tickers);
        self.commit(next)
    }

    fn commit(&mut self, next: Document) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(&next)?;
        self.storage.store(STORAGE_KEY, &json)?;
        self.doc = next;
        Ok(())
    }
}

fn valid_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();
    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name)
    }
}

/// Splits free-form input into tickers, case is left untouched
pub fn parse_tickers(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[derive(Debug, Default, Clone)]
    struct MemoryStorage {
        entries: FxHashMap<String, String>,
        read_only: bool,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self::default()
        }

        /// Storage whose writes all fail
        fn read_only() -> Self {
            Self {
                read_only: true,
                ..Self::default()
            }
        }

        fn with_entry(mut self, key: &str, value: &str) -> Self {
            self.entries.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl Persistence for MemoryStorage {
        fn load(&self, key: &str) -> Option<String> {
            self.entries.get(key).cloned()
        }

        fn store(&mut self, key: &str, value: &str) -> io::Result<()> {
            if self.read_only {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "storage is read-only",
                ));
            }
            self.entries.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_rejects_duplicates() {
        let mut store = WatchlistStore::load(MemoryStorage::new());

        store.create("tech").unwrap();
        store.replace("tech", tickers(&["AAPL"])).unwrap();

        assert!(matches!(store.create(" tech "), Err(Error::DuplicateName(n)) if n == "tech"));
        assert_eq!(store.get("tech"), Some(tickers(&["AAPL"]).as_slice()));
        assert!(matches!(store.create("   "), Err(Error::EmptyName)));
    }

    #[test]
    fn replace_round_trips_through_storage() {
        let mut store = WatchlistStore::load(MemoryStorage::new());
        store.replace("energy", tickers(&["XOM", "CVX"])).unwrap();
        store.replace("banks", tickers(&["JPM"])).unwrap();
        store.replace("energy", tickers(&["XOM"])).unwrap();

        let reloaded = WatchlistStore::load(store.storage);

        assert_eq!(reloaded.list(), vec!["banks", "energy"]);
        assert_eq!(reloaded.get("energy"), Some(tickers(&["XOM"]).as_slice()));
        assert!(reloaded.exists("banks"));
        assert!(!reloaded.exists("tech"));
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let storage = MemoryStorage::read_only()
            .with_entry(STORAGE_KEY, r#"{"watchlists": {"tech": ["AAPL"]}}"#);
        let mut store = WatchlistStore::load(storage);

        assert!(matches!(store.create("new"), Err(Error::Persist(_))));
        assert!(matches!(
            store.replace("tech", tickers(&["MSFT"])),
            Err(Error::Persist(_))
        ));

        assert_eq!(store.list(), vec!["tech"]);
        assert_eq!(store.get("tech"), Some(tickers(&["AAPL"]).as_slice()));
    }

    #[test]
    fn corrupt_document_starts_empty() {
        for raw in ["not json", r#"{"watchlists": 5}"#, "[]"] {
            let store = WatchlistStore::load(MemoryStorage::new().with_entry(STORAGE_KEY, raw));
            assert!(store.list().is_empty(), "{raw}");
        }

        let store = WatchlistStore::load(MemoryStorage::new().with_entry(STORAGE_KEY, "{}"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn file_storage_persists_between_loads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        let mut store = WatchlistStore::load(storage.clone());
        store.replace("tech", tickers(&["AAPL", "msft"])).unwrap();

        let reloaded = WatchlistStore::load(storage);
        assert_eq!(reloaded.get("tech"), Some(tickers(&["AAPL", "msft"]).as_slice()));

        let raw = fs::read_to_string(dir.path().join("nested").join("watchlists.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["watchlists"]["tech"][1], "msft");
    }

    #[test]
    fn parses_whitespace_separated_tickers() {
        assert_eq!(parse_tickers("  AAPL\tmsft \n GOOGL  "), tickers(&["AAPL", "msft", "GOOGL"]));
        assert!(parse_tickers("   ").is_empty());
    }
}
