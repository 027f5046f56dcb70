use serde_json::{json, Value};
use std::collections::HashMap;

/// Read-only in-memory data behind the demo routes.
///
/// Owned by the demo application and handed to handlers through the `store`
/// provider; there is no global state.
#[derive(Debug, Clone)]
pub struct ItemStore {
    listing: Vec<Value>,
    named: HashMap<String, String>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ItemStore {
    pub fn new(listing: Vec<Value>, named: HashMap<String, String>) -> Self {
        Self { listing, named }
    }

    /// `Foo`, `Bar` and `Baz` in the listing; `foo` as the one named item.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(
            ["Foo", "Bar", "Baz"]
                .into_iter()
                .map(|name| json!({ "item_name": name }))
                .collect(),
            HashMap::from([("foo".to_string(), "The Foo Wrestlers".to_string())]),
        )
    }

    /// Up to `limit` listing entries starting at `skip`; empty past the end.
    #[must_use]
    pub fn page(&self, skip: usize, limit: usize) -> Vec<Value> {
        self.listing.iter().skip(skip).take(limit).cloned().collect()
    }

    #[must_use]
    pub fn named(&self, id: &str) -> Option<&str> {
        self.named.get(id).map(String::as_str)
    }
}
