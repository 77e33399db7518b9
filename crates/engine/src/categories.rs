//! Category catalog.
//!
//! The catalog is fixed when the ledger is created and never mutated at
//! runtime. Keys are stable identifiers stored on every spend event; display
//! name, icon and color are presentation data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// A spend category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub display_name: String,
    pub icon: String,
    pub color: String,
}

impl Category {
    fn new(display_name: &str, icon: &str, color: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

/// Mapping from category key to [`Category`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog(BTreeMap<String, Category>);

impl CategoryCatalog {
    /// Returns the category for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Category> {
        self.0.get(key)
    }

    /// Returns `true` if `key` is in the catalog.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates `(key, category)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display name for `key`, falling back to the key itself.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |c| c.display_name.as_str())
    }

    /// Resolves user input to a catalog key.
    ///
    /// Matches the key or the display name, ignoring case, accents and
    /// surrounding whitespace, so `"Farmácia"`, `"farmacia"` and
    /// `" FARMACIA "` all resolve to `farmacia`.
    pub fn resolve(&self, input: &str) -> ResultEngine<String> {
        let wanted = normalize_key(input).ok_or(EngineError::MissingField("category"))?;
        self.0
            .iter()
            .find(|(key, category)| {
                normalize_key(key).as_deref() == Some(wanted.as_str())
                    || normalize_key(&category.display_name).as_deref() == Some(wanted.as_str())
            })
            .map(|(key, _)| key.clone())
            .ok_or_else(|| EngineError::KeyNotFound(input.trim().to_string()))
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let entries = [
            ("padaria", Category::new("Padaria", "fas fa-bread-slice", "#FF9800")),
            ("compras", Category::new("Compras Online", "fas fa-shopping-bag", "#2196F3")),
            ("gasolina", Category::new("Gasolina", "fas fa-gas-pump", "#795548")),
            ("farmacia", Category::new("Farmácia", "fas fa-pills", "#4CAF50")),
            ("bares", Category::new("Bares", "fas fa-beer", "#FF5722")),
            ("ifood", Category::new("iFood", "fas fa-hamburger", "#E91E63")),
            ("uber", Category::new("Uber", "fas fa-taxi", "#000000")),
            ("outros", Category::new("Outros", "fas fa-ellipsis-h", "#9C27B0")),
        ];
        Self(
            entries
                .into_iter()
                .map(|(key, category)| (key.to_string(), category))
                .collect(),
        )
    }
}

/// Lowercases, strips combining marks and collapses non-alphanumeric runs
/// into a single space.
fn normalize_key(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::new();
    let mut prev_space = false;
    for ch in trimmed.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}
