//! Keyed batch loading: fetch the children of many parents in one round trip,
//! then fan the rows out into a map keyed by parent id.

use std::{collections::HashMap, hash::Hash};

/// Group `(key, child)` rows by key. Every requested key gets an entry, so a
/// parent with no children maps to an empty `Vec` rather than being absent.
/// Row order is preserved within each key.
pub fn group_by_key<K, V, I>(keys: &[K], rows: I) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = (K, V)>,
{
    let mut grouped: HashMap<K, Vec<V>> = keys.iter().map(|&key| (key, Vec::new())).collect();
    for (key, value) in rows {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

/// Take a parent's children out of a grouped map; a missing key yields an
/// empty `Vec`.
pub fn take_or_empty<K, V>(grouped: &mut HashMap<K, Vec<V>>, key: &K) -> Vec<V>
where
    K: Eq + Hash,
{
    grouped.remove(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_key_seeds_every_key() {
        let grouped = group_by_key(&[1, 2, 3], vec![(1, "a"), (3, "b"), (1, "c")]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[&1], vec!["a", "c"]);
        assert!(grouped[&2].is_empty());
        assert_eq!(grouped[&3], vec!["b"]);
    }

    #[test]
    fn test_group_by_key_keeps_unrequested_rows() {
        let grouped = group_by_key(&[1], vec![(2, "x")]);
        assert_eq!(grouped[&2], vec!["x"]);
    }

    #[test]
    fn test_take_or_empty() {
        let mut grouped = group_by_key(&[1], vec![(1, 10)]);
        assert_eq!(take_or_empty(&mut grouped, &1), vec![10]);
        assert!(take_or_empty(&mut grouped, &1).is_empty());
        assert!(take_or_empty(&mut grouped, &99).is_empty());
    }
}
