// ── Locale messages ──
//
// Human-readable status strings used by observers, keyed by string
// constants. Lookups never fail; a miss yields a fixed placeholder.

use indexmap::IndexMap;

/// Returned by [`MessageRepository::get`] for unknown keys.
pub const MISSING_MESSAGE: &str = "key is not defined";

pub const NEW: &str = "form.new.text";
pub const EDIT: &str = "form.edit.text";
pub const NO_RECORD: &str = "form.noRecord.text";
pub const FOUND: &str = "form.found.text";
pub const RECORDS: &str = "form.records.text";
pub const SAVED: &str = "form.saved.text";
pub const FAILED: &str = "form.failed.text";
pub const DISPLAYING_PAGE: &str = "form.displayingPage.text";
pub const OF: &str = "form.of.text";
pub const TOTAL_PAGES: &str = "form.totalPages.text";
pub const OK: &str = "form.ok.text";
pub const ALERT_SURE: &str = "standard.alertSure.text";
pub const PROCESSING: &str = "standard.processing.text";
pub const ERROR: &str = "standard.err.text";
pub const SUCCESS: &str = "standard.ok.text";
pub const LIST_LOAD_OK: &str = "standard.listloadok.text";
pub const LIST_LOAD_ERROR: &str = "standard.listloaderr.text";

const DEFAULTS: [(&str, &str); 17] = [
    (NEW, "New"),
    (EDIT, "Edit"),
    (NO_RECORD, "No record found."),
    (FOUND, "Found"),
    (RECORDS, "Record(s)"),
    (SAVED, "Save"),
    (FAILED, "Failed"),
    (DISPLAYING_PAGE, "Displaying Page"),
    (OF, "Of"),
    (TOTAL_PAGES, ""),
    (OK, "Ok"),
    (ALERT_SURE, "Are you sure to delete this record."),
    (PROCESSING, "Processing..."),
    (
        ERROR,
        "Requested operation failed, an error occured while processing your request.",
    ),
    (SUCCESS, "Request operation completed successfully."),
    (LIST_LOAD_OK, "List loaded successfully."),
    (LIST_LOAD_ERROR, "List load failed."),
];

/// Insertion-ordered key/value message table.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    messages: IndexMap<String, String>,
}

impl Default for MessageRepository {
    fn default() -> Self {
        let mut repo = Self::empty();
        for (key, value) in DEFAULTS {
            repo.add(key, value);
        }
        repo
    }
}

impl MessageRepository {
    /// The default English table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            messages: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.messages
            .get(key)
            .map_or(MISSING_MESSAGE, String::as_str)
    }

    /// Add a message, replacing the value of an existing key in place.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.messages.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.messages.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay another set of messages on top of this one.
    pub fn extend<K, V>(&mut self, overrides: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in overrides {
            self.add(key, value);
        }
    }

    /// `"Found {total} Record(s) Displaying Page {page} Of {pages}"`.
    pub fn found_summary(&self, total: u64, page: u32, pages: u64) -> String {
        format!(
            "{} {total} {} {} {page} {} {pages} {}",
            self.get(FOUND),
            self.get(RECORDS),
            self.get(DISPLAYING_PAGE),
            self.get(OF),
            self.get(TOTAL_PAGES),
        )
        .trim_end()
        .to_owned()
    }
}
