// Metadata-driven chooser that turns a key and a value into a filter

use crate::api::StatsBackend;
use crate::domain::Collection;
use crate::error::FetchError;
use crate::filters::is_unselected;
use crate::sync::SyncEvent;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NO_VALUE_LABEL: &str = "No Value Selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerStage {
    Keys,
    Values,
}

/// Metadata loaded in the background for the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerUpdate {
    Keys {
        collection: Collection,
        result: Result<Vec<String>, FetchError>,
    },
    Values {
        key: String,
        result: Result<Vec<String>, FetchError>,
    },
}

pub async fn load_keys(backend: Arc<dyn StatsBackend>, collection: Collection) -> PickerUpdate {
    let result = backend.metadata_keys(collection).await;
    PickerUpdate::Keys { collection, result }
}

pub async fn load_values(backend: Arc<dyn StatsBackend>, key: String) -> PickerUpdate {
    let result = backend.metadata_values(&key).await;
    PickerUpdate::Values { key, result }
}

#[derive(Debug, Clone)]
pub struct FilterPicker {
    collection: Collection,
    stage: PickerStage,
    keys: Vec<String>,
    values: Vec<String>,
    selected_key: Option<String>,
    query: String,
    /// Cursor in the visible list. On the value stage 0 is the sentinel.
    cursor: usize,
    loading: bool,
    error: Option<String>,
}

impl FilterPicker {
    pub const fn new(collection: Collection) -> Self {
        Self {
            collection,
            stage: PickerStage::Keys,
            keys: Vec::new(),
            values: Vec::new(),
            selected_key: None,
            query: String::new(),
            cursor: 0,
            loading: true,
            error: None,
        }
    }

    pub const fn stage(&self) -> PickerStage {
        self.stage
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    pub fn apply(&mut self, update: PickerUpdate) {
        match update {
            PickerUpdate::Keys { collection, result } => {
                if collection != self.collection || self.stage != PickerStage::Keys {
                    debug!(collection = collection.as_str(), "ignoring keys for an earlier picker");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(keys) => self.keys = keys,
                    Err(err) => {
                        warn!(%err, "failed to load metadata keys");
                        self.error = Some(err.to_string());
                    }
                }
            }
            PickerUpdate::Values { key, result } => {
                if self.selected_key.as_deref() != Some(key.as_str()) {
                    debug!(%key, "values arrived for a key that is no longer selected");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(values) => {
                        self.values = values
                            .into_iter()
                            .filter(|value| !is_unselected(value))
                            .collect();
                    }
                    Err(err) => {
                        warn!(%err, %key, "failed to load metadata values");
                        self.error = Some(err.to_string());
                    }
                }
            }
        }
    }

    /// Keys matching the query, best match first.
    pub fn visible_keys(&self) -> Vec<&str> {
        fuzzy_filter(&self.keys, &self.query)
    }

    /// Known values matching the query. Empty when the key has no values.
    pub fn options(&self) -> Vec<&str> {
        fuzzy_filter(&self.values, &self.query)
    }

    /// The value list as shown: the sentinel, then the options.
    pub fn choices(&self) -> Vec<&str> {
        std::iter::once(NO_VALUE_LABEL).chain(self.options()).collect()
    }

    fn visible_len(&self) -> usize {
        match self.stage {
            PickerStage::Keys => self.visible_keys().len(),
            PickerStage::Values => self.options().len() + 1,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.cursor = 0;
    }

    pub fn move_down(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    pub fn move_up(&mut self) {
        let len = self.visible_len();
        if len > 0 {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    /// Moves to the value stage for the key under the cursor and returns it
    /// so the caller can load its values.
    pub fn select_key(&mut self) -> Option<String> {
        if self.stage != PickerStage::Keys {
            return None;
        }
        let key = (*self.visible_keys().get(self.cursor)?).to_string();
        self.selected_key = Some(key.clone());
        self.values.clear();
        self.query.clear();
        self.cursor = 0;
        self.loading = true;
        self.error = None;
        self.stage = PickerStage::Values;
        Some(key)
    }

    /// Back to the key list.
    pub fn back(&mut self) {
        self.stage = PickerStage::Keys;
        self.selected_key = None;
        self.values.clear();
        self.query.clear();
        self.cursor = 0;
        self.loading = false;
        self.error = None;
    }

    /// The filter chosen under the cursor, or `None` for the sentinel.
    pub fn choose(&self) -> Option<SyncEvent> {
        if self.stage != PickerStage::Values || self.cursor == 0 {
            return None;
        }
        let key = self.selected_key.clone()?;
        let value = (*self.options().get(self.cursor - 1)?).to_string();
        Some(SyncEvent::FilterAdded { key, value })
    }
}

fn fuzzy_filter<'a>(items: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return items.iter().map(String::as_str).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = items
        .iter()
        .filter_map(|item| {
            matcher
                .fuzzy_match(item, query)
                .map(|score| (score, item.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockBackend;

    fn keys(collection: Collection, keys: &[&str]) -> PickerUpdate {
        PickerUpdate::Keys {
            collection,
            result: Ok(keys.iter().map(ToString::to_string).collect()),
        }
    }

    async fn picker_with(backend: MockBackend) -> FilterPicker {
        let mut picker = FilterPicker::new(Collection::CallStacks);
        picker.apply(load_keys(Arc::new(backend), Collection::CallStacks).await);
        picker
    }

    #[tokio::test]
    async fn key_without_values_offers_only_the_sentinel() {
        let backend = MockBackend::new().with_keys(&["host"]);
        let mut picker = picker_with(backend.clone()).await;
        assert_eq!(picker.visible_keys(), ["host"]);

        let key = picker.select_key();
        assert_eq!(key.as_deref(), Some("host"));
        picker.apply(load_values(Arc::new(backend), "host".to_string()).await);

        assert!(picker.options().is_empty());
        assert_eq!(picker.choices(), [NO_VALUE_LABEL]);
        assert_eq!(picker.error(), None);
        assert_eq!(picker.choose(), None);
    }

    #[tokio::test]
    async fn choosing_a_value_adds_a_filter() {
        let backend = MockBackend::new()
            .with_keys(&["host", "user"])
            .with_values("user", &["alice", "bob"]);
        let mut picker = picker_with(backend.clone()).await;

        picker.move_down();
        let key = picker.select_key();
        assert_eq!(key.as_deref(), Some("user"));
        picker.apply(load_values(Arc::new(backend), "user".to_string()).await);

        assert_eq!(picker.choose(), None);
        picker.move_down();
        picker.move_down();
        assert_eq!(
            picker.choose(),
            Some(SyncEvent::FilterAdded {
                key: "user".to_string(),
                value: "bob".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn query_narrows_the_list() {
        let backend = MockBackend::new().with_keys(&["hostname", "user", "thread"]);
        let mut picker = picker_with(backend).await;
        for c in "hst".chars() {
            picker.push_char(c);
        }
        assert_eq!(picker.visible_keys(), ["hostname"]);
        picker.pop_char();
        picker.pop_char();
        picker.pop_char();
        assert_eq!(picker.visible_keys().len(), 3);
    }

    #[test]
    fn late_values_for_another_key_are_ignored() {
        let mut picker = FilterPicker::new(Collection::CallStacks);
        picker.apply(keys(Collection::CallStacks, &["host", "user"]));
        picker.select_key();
        picker.apply(PickerUpdate::Values {
            key: "user".to_string(),
            result: Ok(vec!["alice".to_string()]),
        });
        assert!(picker.options().is_empty());
        assert!(picker.is_loading());
    }

    #[test]
    fn sentinel_values_from_the_backend_are_not_offered() {
        let mut picker = FilterPicker::new(Collection::CallStacks);
        picker.apply(keys(Collection::CallStacks, &["host"]));
        picker.select_key();
        picker.apply(PickerUpdate::Values {
            key: "host".to_string(),
            result: Ok(vec!["0".to_string(), "web-1".to_string()]),
        });
        assert_eq!(picker.options(), ["web-1"]);
    }

    #[test]
    fn keys_for_another_collection_are_ignored() {
        let mut picker = FilterPicker::new(Collection::SqlStatements);
        picker.apply(keys(Collection::CallStacks, &["thread"]));
        assert!(picker.visible_keys().is_empty());
        assert!(picker.is_loading());

        picker.apply(keys(Collection::SqlStatements, &["host"]));
        assert_eq!(picker.visible_keys(), ["host"]);
    }

    #[test]
    fn late_keys_do_not_touch_the_value_stage() {
        let mut picker = FilterPicker::new(Collection::CallStacks);
        picker.apply(keys(Collection::CallStacks, &["host"]));
        picker.select_key();
        assert!(picker.is_loading());

        picker.apply(keys(Collection::CallStacks, &["user"]));
        assert_eq!(picker.stage(), PickerStage::Values);
        assert!(picker.is_loading());
        assert_eq!(picker.selected_key(), Some("host"));
    }

    #[tokio::test]
    async fn failed_key_load_is_reported_not_raised() {
        let backend = MockBackend::new().fail("keys:", FetchError::network("refused"));
        let picker = picker_with(backend).await;
        assert!(picker.visible_keys().is_empty());
        assert!(picker.error().is_some());
        assert!(!picker.is_loading());
    }
}
