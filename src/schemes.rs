//! Scheme store: a chained hash table from scheme name to template

use serde::Serialize;

const INITIAL_CAPACITY: usize = 16;
const LOAD_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeEntry {
    pub name: String,
    pub template: String,
}

fn exceeds_load(size: usize, capacity: usize) -> bool {
    size as f64 > capacity as f64 * LOAD_FACTOR
}

/// Polynomial string hash over the name's code points.
fn hash(name: &str) -> u32 {
    name.chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

/// Bucket layout exposed for debugging
#[derive(Debug, Clone, Serialize)]
pub struct HashView {
    pub capacity: usize,
    pub size: usize,
    pub buckets: Vec<Vec<BucketEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketEntry {
    pub key: String,
    pub value: String,
}

pub struct SchemeStore {
    buckets: Vec<Vec<SchemeEntry>>,
    size: usize,
}

impl Default for SchemeStore {
    fn default() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }
}

impl SchemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buckets: vec![Vec::new(); capacity],
            size: 0,
        }
    }

    fn bucket_index(&self, name: &str) -> usize {
        hash(name) as usize % self.buckets.len()
    }

    /// Insert or overwrite. Returns the previous template, if any.
    pub fn put(&mut self, name: &str, template: &str) -> Option<String> {
        let idx = self.bucket_index(name);
        if let Some(entry) = self.buckets[idx].iter_mut().find(|e| e.name == name) {
            return Some(std::mem::replace(&mut entry.template, template.to_string()));
        }

        self.buckets[idx].push(SchemeEntry {
            name: name.to_string(),
            template: template.to_string(),
        });
        self.size += 1;

        if exceeds_load(self.size, self.buckets.len()) {
            self.resize(self.buckets.len() * 2);
        }
        None
    }

    /// Capacity the table will have after `put(name, ..)`.
    pub fn capacity_after_put(&self, name: &str) -> usize {
        let capacity = self.buckets.len();
        if !self.contains(name) && exceeds_load(self.size + 1, capacity) {
            capacity * 2
        } else {
            capacity
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.buckets[self.bucket_index(name)]
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.template.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let idx = self.bucket_index(name);
        let bucket = &mut self.buckets[idx];
        match bucket.iter().position(|e| e.name == name) {
            Some(pos) => {
                bucket.remove(pos);
                self.size -= 1;
                true
            }
            None => false,
        }
    }

    /// Entries in bucket order, then insertion order within a bucket
    pub fn iter(&self) -> impl Iterator<Item = &SchemeEntry> {
        self.buckets.iter().flatten()
    }

    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|e| e.name.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|e| (e.name.clone(), e.template.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn view(&self) -> HashView {
        HashView {
            capacity: self.capacity(),
            size: self.size,
            buckets: self
                .buckets
                .iter()
                .map(|bucket| {
                    bucket
                        .iter()
                        .map(|e| BucketEntry {
                            key: e.name.clone(),
                            value: e.template.clone(),
                        })
                        .collect()
                })
                .collect(),
        }
    }

    fn resize(&mut self, capacity: usize) {
        let old = std::mem::replace(&mut self.buckets, vec![Vec::new(); capacity]);
        for entry in old.into_iter().flatten() {
            let idx = self.bucket_index(&entry.name);
            self.buckets[idx].push(entry);
        }
        debug_assert_eq!(self.iter().count(), self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut store = SchemeStore::new();
        assert_eq!(store.put("فاعل", "{1}ا{2}{3}"), None);
        assert_eq!(store.put("مفعول", "م{1}{2}و{3}"), None);
        assert_eq!(store.get("فاعل"), Some("{1}ا{2}{3}"));
        assert_eq!(store.get("مفعول"), Some("م{1}{2}و{3}"));
        assert_eq!(store.get("فعال"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = SchemeStore::new();
        store.put("فعيل", "{1}{2}{3}");
        let previous = store.put("فعيل", "{1}{2}ي{3}");
        assert_eq!(previous.as_deref(), Some("{1}{2}{3}"));
        assert_eq!(store.get("فعيل"), Some("{1}{2}ي{3}"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut store = SchemeStore::new();
        store.put("فاعل", "{1}ا{2}{3}");
        assert!(store.remove("فاعل"));
        assert!(store.get("فاعل").is_none());
        assert!(!store.remove("فاعل"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_growth_keeps_every_entry() {
        let mut store = SchemeStore::with_capacity(2);
        let names: Vec<String> = (0..200).map(|i| format!("scheme{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            store.put(name, &format!("{{1}}{i}"));
        }
        assert_eq!(store.len(), 200);
        assert!(store.capacity() >= 256);
        for (i, name) in names.iter().enumerate() {
            assert_eq!(store.get(name), Some(format!("{{1}}{i}").as_str()));
        }
        assert_eq!(store.keys().len(), 200);
        for name in names.iter().step_by(2) {
            assert!(store.remove(name));
        }
        assert_eq!(store.len(), 100);
        assert!(store.get("scheme0").is_none());
        assert!(store.get("scheme1").is_some());
    }

    #[test]
    fn test_collisions_chain_in_one_bucket() {
        let mut store = SchemeStore::with_capacity(1);
        store.put("a", "1");
        store.put("b", "2");
        store.put("c", "3");
        assert_eq!(store.get("a"), Some("1"));
        assert_eq!(store.get("b"), Some("2"));
        assert_eq!(store.get("c"), Some("3"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.view().buckets[0].len(), 3);
    }

    #[test]
    fn test_capacity_after_put_predicts_growth() {
        let mut store = SchemeStore::with_capacity(4);
        for name in ["a", "b", "c"] {
            assert_eq!(store.capacity_after_put(name), 4);
            store.put(name, "x");
        }
        assert_eq!(store.capacity_after_put("c"), 4);
        assert_eq!(store.capacity_after_put("d"), 8);
        store.put("d", "x");
        assert_eq!(store.capacity(), 8);
    }

    #[test]
    fn test_same_capacity_and_order_give_same_layout() {
        let mut grown = SchemeStore::with_capacity(2);
        for name in ["w", "x", "y", "z"] {
            grown.put(name, name);
        }
        grown.remove("x");

        let mut rebuilt = SchemeStore::with_capacity(grown.capacity());
        for name in ["w", "y", "z"] {
            rebuilt.put(name, name);
        }
        assert_eq!(rebuilt.keys(), grown.keys());
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash("فاعل"), hash("فاعل"));
        assert_ne!(hash("فاعل"), hash("مفعول"));
        assert_eq!(hash(""), 0);
    }

    #[test]
    fn test_view_matches_contents() {
        let mut store = SchemeStore::new();
        store.put("فاعل", "{1}ا{2}{3}");
        store.put("مفعول", "م{1}{2}و{3}");
        let view = store.view();
        assert_eq!(view.capacity, 16);
        assert_eq!(view.buckets.len(), 16);
        assert_eq!(view.size, 2);
        let total: usize = view.buckets.iter().map(Vec::len).sum();
        assert_eq!(total, 2);
    }
}
