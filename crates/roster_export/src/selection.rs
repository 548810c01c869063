use serde::{Deserialize, Serialize};

use crate::catalog::{self, FieldCategory};

/// The fields a user has ticked in the export dialog, in the order they were
/// ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    keys: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection holding `keys` in order; duplicates are dropped.
    pub fn from_keys<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        let mut selection = Self::new();
        for key in keys {
            let key = key.into();
            if !selection.includes(&key) {
                selection.keys.push(key);
            }
        }
        selection
    }

    /// Adds `key` if absent, removes it if present.
    pub fn toggle(&mut self, key: &str) {
        match self.keys.iter().position(|k| k == key) {
            Some(idx) => {
                self.keys.remove(idx);
            }
            None => self.keys.push(key.to_string()),
        }
    }

    pub fn includes(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn reset(&mut self) {
        self.keys.clear();
    }

    /// Selects every field of `category`, or deselects them all when the
    /// whole category is already selected.
    pub fn toggle_category(&mut self, category: FieldCategory) {
        if self.is_category_selected(category) {
            let in_category: Vec<&str> = catalog::fields_in(category).map(|f| f.key).collect();
            self.keys.retain(|k| !in_category.contains(&k.as_str()));
        } else {
            for field in catalog::fields_in(category) {
                if !self.includes(field.key) {
                    self.keys.push(field.key.to_string());
                }
            }
        }
    }

    pub fn is_category_selected(&self, category: FieldCategory) -> bool {
        catalog::fields_in(category).all(|f| self.includes(f.key))
    }

    pub fn select_all_catalog(&mut self) {
        for field in catalog::all_fields() {
            if !self.includes(field.key) {
                self.keys.push(field.key.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Keys sorted into catalog order. Keys the catalog does not know keep
    /// their relative order at the end.
    pub fn in_catalog_order(&self) -> Vec<String> {
        let mut known: Vec<(usize, &String)> = Vec::new();
        let mut unknown: Vec<&String> = Vec::new();
        for key in &self.keys {
            match catalog::position(key) {
                Some(pos) => known.push((pos, key)),
                None => unknown.push(key),
            }
        }
        known.sort_by_key(|(pos, _)| *pos);
        known
            .into_iter()
            .map(|(_, k)| k)
            .chain(unknown)
            .cloned()
            .collect()
    }
}

/// Which columns an export carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFields {
    /// Every key of the first record, in its stored order.
    All,
    Selected(Selection),
}

impl ExportFields {
    pub fn is_all(&self) -> bool {
        matches!(self, ExportFields::All)
    }

    /// True when nothing would be exported: an explicit, empty selection.
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, ExportFields::Selected(s) if s.is_empty())
    }
}

impl From<Selection> for ExportFields {
    fn from(selection: Selection) -> Self {
        ExportFields::Selected(selection)
    }
}
