//! A dictionary that can hold multiple values per key.
//!
//! Submitted form data routinely repeats a key (one entry per selected
//! choice), so the binding layer stores it in a [`MultiValueDict`]. Keys keep
//! their first-insertion order so that re-encoding a submission is stable.

use std::collections::HashMap;
use std::hash::Hash;

/// A dictionary that maps keys to lists of values, in key insertion order.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key while
/// [`get_list`](MultiValueDict::get_list) returns all of them.
///
/// # Examples
///
/// ```
/// use queryform_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("integer_with_choices".to_string(), "1");
/// d.append("integer_with_choices".to_string(), "3");
///
/// assert_eq!(d.get(&"integer_with_choices".to_string()), Some(&"3"));
/// assert_eq!(d.get_list(&"integer_with_choices".to_string()), &["1", "3"]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash + Clone, V> {
    order: Vec<K>,
    inner: HashMap<K, Vec<V>>,
}

impl<K: Eq + Hash + Clone, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            inner: HashMap::new(),
        }
    }

    /// Returns the **last** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns every value associated with the key; empty if absent.
    pub fn get_list(&self, key: &K) -> &[V] {
        self.inner.get(key).map_or(&[], Vec::as_slice)
    }

    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        self.set_list(key, vec![value]);
    }

    /// Replaces all values for a key.
    pub fn set_list(&mut self, key: K, values: Vec<V>) {
        if !self.inner.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.inner.insert(key, values);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        if let Some(values) = self.inner.get_mut(&key) {
            values.push(value);
        } else {
            self.order.push(key.clone());
            self.inner.insert(key, vec![value]);
        }
    }

    /// Removes a key, returning its values.
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        let removed = self.inner.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Returns `(key, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.order
            .iter()
            .map(move |k| (k, self.inner.get(k).map_or(&[][..], Vec::as_slice)))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.append(k, v);
        }
        dict
    }
}
