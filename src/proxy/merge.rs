//! Merge engine for reconciling proxy collections
//!
//! Combines the previously published canonical set with a freshly scraped
//! batch into one collection, unique by identity key. When two records
//! collide, the one with the longer JSON serialization wins — serialized
//! length as a stand-in for "carries more information". Ties keep whichever
//! record was seen first, so the existing set wins over the incoming one for
//! equally complete records.

use crate::proxy::models::Proxy;
use std::collections::HashMap;

/// Merge two proxy collections, removing duplicates by identity key.
///
/// Output order is the insertion order of each first-seen identity key;
/// a later, longer duplicate replaces the stored record in place without
/// moving it.
pub fn merge(existing: Vec<Proxy>, incoming: Vec<Proxy>) -> Vec<Proxy> {
    let mut merged: Vec<Proxy> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for proxy in existing.into_iter().chain(incoming) {
        let key = proxy.identity_key();
        match index_by_key.get(&key) {
            None => {
                index_by_key.insert(key, merged.len());
                merged.push(proxy);
            }
            Some(&idx) => {
                if proxy.serialized_len() > merged[idx].serialized_len() {
                    merged[idx] = proxy;
                }
            }
        }
    }

    merged
}
