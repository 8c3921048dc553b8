use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A map that allocates nothing until the first insert.
///
/// Used for per-element derived indices, where most elements never need
/// one. `clear` drops the map entirely, returning to the unbuilt state.
pub(crate) struct LazyHashMap<K, V> {
    map: Option<HashMap<K, V>>,
}

impl<K, V> LazyHashMap<K, V>
where
    K: Hash + Eq,
{
    pub(crate) fn new() -> LazyHashMap<K, V> {
        LazyHashMap { map: None }
    }

    pub(crate) fn is_built(&self) -> bool {
        self.map.is_some()
    }

    pub(crate) fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.map.as_ref().and_then(|m| m.get(key))
    }

    pub(crate) fn insert(&mut self, key: K, val: V) -> Option<V> {
        self.map
            .get_or_insert_with(HashMap::new)
            .insert(key, val)
    }

    pub(crate) fn clear(&mut self) {
        self.map = None;
    }
}
