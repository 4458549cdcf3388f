//! Response cache with tag-based invalidation.
//!
//! Every cached query records the tags it provides. A mutation invalidates a
//! set of tags, dropping every entry that provided a matching tag so the next
//! read goes back to the API.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Resource family a tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Users,
    Auth,
    Workspaces,
    WorkspaceMembers,
    Documents,
    Search,
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagKind::Users => "Users",
            TagKind::Auth => "Auth",
            TagKind::Workspaces => "Workspaces",
            TagKind::WorkspaceMembers => "WorkspaceMembers",
            TagKind::Documents => "Documents",
            TagKind::Search => "Search",
        };
        f.write_str(name)
    }
}

/// A resource family, optionally narrowed to one id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagKind,
    pub id: Option<String>,
}

impl Tag {
    /// Tag covering the whole family
    pub fn all(kind: TagKind) -> Self {
        Self { kind, id: None }
    }

    pub fn id(kind: TagKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    /// Whether invalidating `self` should drop an entry that provided `provided`.
    /// A family-wide tag matches every tag of its kind; an id tag matches only
    /// the same kind and id.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match &self.id {
            None => true,
            Some(id) => provided.id.as_deref() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    tags: Vec<Tag>,
}

/// Cache of decoded API responses keyed by endpoint and arguments
#[derive(Default)]
pub struct ApiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock leaves only cached data behind
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value for `key`, if present and still decodable as `T`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store `value` under `key`. The newest write wins regardless of the
    /// order in which requests were issued.
    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: &T, tags: Vec<Tag>) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.lock().insert(key, CacheEntry { value, tags });
            }
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Drop every entry providing a tag matched by `tags`; returns how many
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| {
            !entry
                .tags
                .iter()
                .any(|provided| tags.iter().any(|tag| tag.invalidates(provided)))
        });
        let removed = before - entries.len();
        if removed > 0 {
            debug!(
                "Invalidated {} cache entries for [{}]",
                removed,
                tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(", ")
            );
        }
        removed
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_tag_invalidates_all_ids() {
        let cache = ApiCache::new();
        cache.insert("doc:1", &1, vec![Tag::id(TagKind::Documents, "1")]);
        cache.insert("docs:ws", &2, vec![Tag::id(TagKind::Documents, "ws")]);
        cache.insert("users", &3, vec![Tag::all(TagKind::Users)]);

        let removed = cache.invalidate(&[Tag::all(TagKind::Documents)]);
        assert_eq!(removed, 2);
        assert!(cache.contains("users"));
    }

    #[test]
    fn test_id_tag_invalidates_only_that_id() {
        let cache = ApiCache::new();
        cache.insert("doc:1", &1, vec![Tag::id(TagKind::Documents, "1")]);
        cache.insert("doc:2", &2, vec![Tag::id(TagKind::Documents, "2")]);
        cache.insert("workspaces", &3, vec![Tag::all(TagKind::Workspaces)]);

        assert_eq!(cache.invalidate(&[Tag::id(TagKind::Documents, "1")]), 1);
        assert!(!cache.contains("doc:1"));
        assert!(cache.contains("doc:2"));

        // an id tag does not reach an entry that provided the family tag
        assert_eq!(cache.invalidate(&[Tag::id(TagKind::Workspaces, "9")]), 0);
        assert!(cache.contains("workspaces"));
    }

    #[test]
    fn test_entry_with_several_tags() {
        let cache = ApiCache::new();
        cache.insert(
            "members:ws",
            &vec!["a", "b"],
            vec![
                Tag::id(TagKind::Workspaces, "ws"),
                Tag::id(TagKind::WorkspaceMembers, "ws"),
            ],
        );
        assert_eq!(cache.invalidate(&[Tag::id(TagKind::WorkspaceMembers, "ws")]), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ApiCache::new();
        cache.insert("doc:1", &"newer", vec![]);
        cache.insert("doc:1", &"older", vec![]);
        assert_eq!(cache.get::<String>("doc:1").as_deref(), Some("older"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_with_wrong_type() {
        let cache = ApiCache::new();
        cache.insert("k", &"text", vec![]);
        assert_eq!(cache.get::<u32>("k"), None);
        cache.clear();
        assert_eq!(cache.get::<String>("k"), None);
    }
}
