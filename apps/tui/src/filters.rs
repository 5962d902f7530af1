// Ordered set of active metadata filters
// Removal renumbers the survivors so the positional encoding never has gaps

use serde::Serialize;
use std::fmt;

/// Value the filter picker uses for "No Value Selected".
pub const NO_VALUE_SENTINEL: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.key, self.value)
    }
}

/// True when `value` means "nothing selected" and must never become a filter.
pub fn is_unselected(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == NO_VALUE_SENTINEL
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub const fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Appends `key = value`. Returns the set unchanged when either side is
    /// empty or the value is the unselected sentinel.
    #[must_use]
    pub fn add(&self, key: &str, value: &str) -> Self {
        let key = key.trim();
        if key.is_empty() || is_unselected(value) {
            return self.clone();
        }

        let mut filters = self.filters.clone();
        filters.push(Filter {
            key: key.to_string(),
            value: value.to_string(),
        });
        Self { filters }
    }

    /// Removes the filter at `index`; later filters shift down one position.
    #[must_use]
    pub fn remove_at(&self, index: usize) -> Self {
        if index >= self.filters.len() {
            return self.clone();
        }

        let mut filters = self.filters.clone();
        filters.remove(index);
        Self { filters }
    }

    #[must_use]
    pub const fn clear(&self) -> Self {
        Self::new()
    }

    pub fn count(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Filter> {
        self.filters.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}
