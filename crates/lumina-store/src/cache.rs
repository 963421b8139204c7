//! Per-user page history persisted to a local key-value cache.
//!
//! Each user's history is one serialized blob under `lumina_history_{user_id}`.
//! Writes replace the whole blob. Reads are tolerant: a missing or unreadable
//! blob is an empty history.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use lumina_core::{GeneratedPage, PageId, UserId};

const KEY_PREFIX: &str = "lumina_history_";

/// Errors that can occur with the local cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Failed to serialize history: {0}")]
    Serialization(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Page belongs to {found}, not to the active user {expected}")]
    WrongOwner { expected: UserId, found: UserId },
}

/// Local persisted key-value storage.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Cache held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Io("cache lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Io("cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Cache that stores each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct DirCache {
    dir: PathBuf,
}

impl DirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl CacheBackend for DirCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io(e.to_string()))?;

        // Same commit as the document store: a crash leaves the old blob intact.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io(e.to_string()))
    }
}

/// Reads and writes whole history blobs.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn CacheBackend>,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    fn key(user_id: &UserId) -> String {
        format!("{}{}", KEY_PREFIX, user_id)
    }

    /// Load a user's history, newest first.
    ///
    /// Returns an empty list when nothing is stored or the blob cannot be
    /// read or parsed. Repeated ids keep their first (newest) occurrence.
    pub fn load(&self, user_id: &UserId) -> Vec<GeneratedPage> {
        let blob = match self.backend.get(&Self::key(user_id)) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read history for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        let pages: Vec<GeneratedPage> = match serde_json::from_str(&blob) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!("Failed to load history for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        pages
            .into_iter()
            .filter(|p| seen.insert(p.id().clone()))
            .collect()
    }

    /// Replace a user's stored history.
    pub fn save(&self, user_id: &UserId, pages: &[GeneratedPage]) -> Result<(), CacheError> {
        let blob =
            serde_json::to_string(pages).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.backend.set(&Self::key(user_id), &blob)
    }
}

/// The active user's in-memory history, kept in sync with the cache.
///
/// Every mutation is saved before it becomes visible, so a failed write leaves
/// the list as it was.
pub struct SessionCache {
    store: HistoryStore,
    user_id: UserId,
    pages: Vec<GeneratedPage>,
}

impl SessionCache {
    /// Load the history of a user.
    pub fn open(store: HistoryStore, user_id: UserId) -> Self {
        let pages = store.load(&user_id);
        tracing::debug!("Loaded {} pages for {}", pages.len(), user_id);
        Self {
            store,
            user_id,
            pages,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Pages, newest first.
    pub fn pages(&self) -> &[GeneratedPage] {
        &self.pages
    }

    pub fn get(&self, id: &PageId) -> Option<&GeneratedPage> {
        self.pages.iter().find(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Persist the current list.
    pub fn save(&self) -> Result<(), CacheError> {
        self.store.save(&self.user_id, &self.pages)
    }

    /// Put a page at the front of the history.
    pub fn append(&mut self, page: GeneratedPage) -> Result<(), CacheError> {
        self.check_owner(&page)?;

        let mut next = Vec::with_capacity(self.pages.len() + 1);
        let id = page.id().clone();
        next.push(page);
        next.extend(self.pages.iter().filter(|p| p.id() != &id).cloned());

        self.commit(next)
    }

    /// Substitute the page with the same id, keeping its position.
    ///
    /// Returns `false` when no such page exists.
    pub fn replace(&mut self, page: GeneratedPage) -> Result<bool, CacheError> {
        self.check_owner(&page)?;

        let Some(index) = self.pages.iter().position(|p| p.id() == page.id()) else {
            return Ok(false);
        };

        let mut next = self.pages.clone();
        next[index] = page;
        self.commit(next)?;
        Ok(true)
    }

    /// Drop a page. Removing an absent id changes nothing.
    pub fn remove(&mut self, id: &PageId) -> Result<bool, CacheError> {
        if self.get(id).is_none() {
            return Ok(false);
        }

        let next = self.pages.iter().filter(|p| p.id() != id).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Empty the history.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.commit(Vec::new())
    }

    /// Make another user active.
    ///
    /// The previous user's pages are dropped before the new history is loaded.
    pub fn switch_user(&mut self, user_id: UserId) {
        self.pages.clear();
        self.pages = self.store.load(&user_id);
        self.user_id = user_id;
    }

    fn check_owner(&self, page: &GeneratedPage) -> Result<(), CacheError> {
        if page.owner_id() != &self.user_id {
            return Err(CacheError::WrongOwner {
                expected: self.user_id.clone(),
                found: page.owner_id().clone(),
            });
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<GeneratedPage>) -> Result<(), CacheError> {
        self.store.save(&self.user_id, &next)?;
        self.pages = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_core::{PageSource, Prompt, PublicId};
    use tempfile::tempdir;

    fn page(owner: &str, title: &str) -> GeneratedPage {
        GeneratedPage::create(
            &Prompt::parse(format!("A page about {}", title)).unwrap(),
            PageSource {
                title: title.to_string(),
                markup: format!("<h1>{}</h1>", title),
                style: String::new(),
                script: String::new(),
            },
            UserId::from(owner),
        )
    }

    fn titles(pages: &[GeneratedPage]) -> Vec<&str> {
        pages.iter().map(|p| p.title()).collect()
    }

    fn memory() -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryCache::new()))
    }

    struct FailingCache;

    impl CacheBackend for FailingCache {
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
            Err(CacheError::Io("disk full".to_string()))
        }
    }

    #[test]
    fn append_then_reload_is_newest_first() {
        let store = memory();
        let mut cache = SessionCache::open(store.clone(), UserId::from("u1"));

        cache.append(page("u1", "First")).unwrap();
        cache.append(page("u1", "Second")).unwrap();
        cache.append(page("u1", "Third")).unwrap();

        let fresh = SessionCache::open(store, UserId::from("u1"));
        assert_eq!(titles(fresh.pages()), ["Third", "Second", "First"]);
        assert_eq!(fresh.pages(), cache.pages());
    }

    #[test]
    fn append_does_not_duplicate_ids() {
        let mut cache = SessionCache::open(memory(), UserId::from("u1"));
        let p = page("u1", "Only");

        cache.append(p.clone()).unwrap();
        cache.append(p).unwrap();

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn rejects_pages_of_other_users() {
        let mut cache = SessionCache::open(memory(), UserId::from("u1"));

        let err = cache.append(page("u2", "Foreign")).unwrap_err();

        assert!(matches!(err, CacheError::WrongOwner { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn replace_keeps_position() {
        let mut cache = SessionCache::open(memory(), UserId::from("u1"));
        let middle = page("u1", "Middle");
        cache.append(page("u1", "Oldest")).unwrap();
        cache.append(middle.clone()).unwrap();
        cache.append(page("u1", "Newest")).unwrap();

        let published = middle.with_public_id(PublicId::from("pub1"));
        assert!(cache.replace(published).unwrap());

        assert_eq!(titles(cache.pages()), ["Newest", "Middle", "Oldest"]);
        assert!(cache.pages()[1].is_published());
    }

    #[test]
    fn replace_of_unknown_page_is_noop() {
        let mut cache = SessionCache::open(memory(), UserId::from("u1"));
        cache.append(page("u1", "Kept")).unwrap();

        assert!(!cache.replace(page("u1", "Stranger")).unwrap());
        assert_eq!(titles(cache.pages()), ["Kept"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = memory();
        let mut cache = SessionCache::open(store.clone(), UserId::from("u1"));
        let gone = page("u1", "Gone");
        cache.append(page("u1", "Kept")).unwrap();
        cache.append(gone.clone()).unwrap();

        assert!(cache.remove(gone.id()).unwrap());
        assert!(!cache.remove(gone.id()).unwrap());
        assert!(!cache.remove(&PageId::from("never")).unwrap());

        assert_eq!(titles(cache.pages()), ["Kept"]);
        assert_eq!(titles(&store.load(&UserId::from("u1"))), ["Kept"]);
    }

    #[test]
    fn clear_empties_stored_history() {
        let store = memory();
        let mut cache = SessionCache::open(store.clone(), UserId::from("u1"));
        cache.append(page("u1", "A")).unwrap();

        cache.clear().unwrap();

        assert!(cache.is_empty());
        assert!(store.load(&UserId::from("u1")).is_empty());
    }

    #[test]
    fn switching_user_never_leaks_history() {
        let store = memory();
        let mut cache = SessionCache::open(store.clone(), UserId::from("u1"));
        cache.append(page("u1", "Mine")).unwrap();

        cache.switch_user(UserId::from("u2"));
        assert!(cache.is_empty());
        assert_eq!(cache.user_id().as_str(), "u2");

        cache.append(page("u2", "Theirs")).unwrap();
        cache.switch_user(UserId::from("u1"));
        assert_eq!(titles(cache.pages()), ["Mine"]);
    }

    #[test]
    fn unparsable_blob_loads_as_empty() {
        let backend = Arc::new(MemoryCache::new());
        backend.set("lumina_history_u1", "{not json").unwrap();

        let cache = SessionCache::open(HistoryStore::new(backend), UserId::from("u1"));

        assert!(cache.is_empty());
    }

    #[test]
    fn failed_write_leaves_list_untouched() {
        let mut cache = SessionCache::open(
            HistoryStore::new(Arc::new(FailingCache)),
            UserId::from("u1"),
        );

        assert!(cache.append(page("u1", "Lost")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn dir_cache_persists_blobs() {
        let temp = tempdir().unwrap();
        let store = HistoryStore::new(Arc::new(DirCache::new(temp.path().join("cache"))));

        let mut cache = SessionCache::open(store, UserId::from("u1"));
        cache.append(page("u1", "Saved")).unwrap();

        assert!(temp.path().join("cache/lumina_history_u1.json").exists());

        let reopened = HistoryStore::new(Arc::new(DirCache::new(temp.path().join("cache"))));
        assert_eq!(titles(&reopened.load(&UserId::from("u1"))), ["Saved"]);
    }

    #[test]
    fn dir_cache_commits_whole_blobs() {
        let temp = tempdir().unwrap();
        let cache = DirCache::new(temp.path());

        cache.set("history", "[1]").unwrap();
        // Leftover from a write that never reached its rename.
        std::fs::write(temp.path().join("history.json.tmp"), "[2, 3").unwrap();
        assert_eq!(cache.get("history").unwrap().as_deref(), Some("[1]"));

        cache.set("history", "[4]").unwrap();
        assert_eq!(cache.get("history").unwrap().as_deref(), Some("[4]"));
        assert!(!temp.path().join("history.json.tmp").exists());
    }

    #[test]
    fn dir_cache_rejects_path_like_keys() {
        let temp = tempdir().unwrap();
        let cache = DirCache::new(temp.path());

        assert!(matches!(
            cache.set("../escape", "x"),
            Err(CacheError::InvalidKey(_))
        ));
    }
}
