//! The shared table of in-flight verification expectations.

use crate::key::{IdentityKey, Snapshot};
use std::collections::HashMap;
use std::sync::Mutex;

/// Maps an identity key to the snapshot captured when its verification
/// request was enqueued.
///
/// Shared between the derive-and-record transform (writer) and the drainer's
/// verification sink (remover); a coarse mutex guards both operations. At
/// pipeline quiescence the map must be empty; anything left over means a
/// request was lost or a response duplicated.
#[derive(Debug, Default)]
pub struct CorrelationMap {
    inner: Mutex<HashMap<IdentityKey, Snapshot>>,
}

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an expectation. Returns the previous snapshot if the key was
    /// already in flight, which callers treat as a duplicate-key overwrite.
    pub fn insert(&self, key: IdentityKey, snapshot: Snapshot) -> Option<Snapshot> {
        self.lock().insert(key, snapshot)
    }

    /// Remove and return the expectation for `key`, if one exists.
    pub fn pop(&self, key: &IdentityKey) -> Option<Snapshot> {
        self.lock().remove(key)
    }

    /// Number of expectations still in flight.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<IdentityKey, Snapshot>> {
        self.inner.lock().expect("correlation map lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyValue;
    use crate::record::Properties;
    use crate::PropertyValue;
    use std::sync::Arc;

    fn key(name: &str) -> IdentityKey {
        IdentityKey::Node(KeyValue::Text(name.to_string()))
    }

    fn snapshot(name: &str) -> Snapshot {
        let mut properties = Properties::new();
        properties.insert("name".to_string(), PropertyValue::from(name));
        Snapshot::Node(properties)
    }

    #[test]
    fn test_insert_then_pop() {
        let map = CorrelationMap::new();
        assert!(map.insert(key("A"), snapshot("A")).is_none());
        assert_eq!(map.len(), 1);

        assert_eq!(map.pop(&key("A")), Some(snapshot("A")));
        assert!(map.is_empty());
        assert_eq!(map.pop(&key("A")), None);
    }

    #[test]
    fn test_duplicate_insert_returns_previous() {
        let map = CorrelationMap::new();
        map.insert(key("A"), snapshot("A"));
        let previous = map.insert(key("A"), snapshot("B"));
        assert_eq!(previous, Some(snapshot("A")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_concurrent_insert_and_pop() {
        let map = Arc::new(CorrelationMap::new());

        let writer = {
            let map = Arc::clone(&map);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    map.insert(key(&format!("k{i}")), snapshot(&format!("k{i}")));
                }
            })
        };

        let remover = {
            let map = Arc::clone(&map);
            std::thread::spawn(move || {
                let mut popped = 0;
                while popped < 1000 {
                    for i in 0..1000 {
                        if map.pop(&key(&format!("k{i}"))).is_some() {
                            popped += 1;
                        }
                    }
                }
                popped
            })
        };

        writer.join().unwrap();
        assert_eq!(remover.join().unwrap(), 1000);
        assert!(map.is_empty());
    }
}
