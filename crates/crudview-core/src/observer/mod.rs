// ── Observer / state synchronizer ──
//
// Projects request and processor events onto a view state snapshot.
// Capabilities are split into small traits; `Observer<T>` implements all
// of them and publishes every change through a `watch` channel, so views
// subscribe instead of being called back.
//
// All mutation happens synchronously inside `send_modify`, one closure per
// transition, so subscribers never see a half-applied result.

mod stream;

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::{trace, warn};

use crudview_api::{Key, Progress, TransportFailure, Verb};

use crate::content::Entity;
use crate::event::{CallInfo, ErrorReport, FieldMessage, ProcessorEvent, RequestEvent};
use crate::messages::{self, MessageRepository};
use crate::pagination::ListNavigator;

pub use stream::{StateStream, StateWatchStream};

// ── Options ──────────────────────────────────────────────────────────

/// How a list result lands in `records`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FillMode {
    /// Each page replaces the list.
    #[default]
    Replace,
    /// Pages accumulate; re-fetching an earlier page truncates after it.
    Continue,
}

/// Wording of result messages.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStyle {
    /// Full sentences from the message table.
    #[default]
    Standard,
    /// `form.saved.text` / `form.failed.text` on both result messages.
    Brief,
}

/// Insertion point for `ListState::insert`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Placement {
    #[default]
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverOptions {
    pub page_size: u32,
    pub scroll_window: u32,
    pub fill_mode: FillMode,
    pub message_style: MessageStyle,
    pub placement: Placement,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            scroll_window: 10,
            fill_mode: FillMode::default(),
            message_style: MessageStyle::default(),
            placement: Placement::default(),
        }
    }
}

// ── State snapshot ───────────────────────────────────────────────────

/// Everything a view renders.
#[derive(Debug, Clone, Serialize)]
pub struct ObserverState<T> {
    pub processing: bool,
    pub form_processing: bool,
    pub result_message: String,
    pub form_result_message: String,
    pub errors: Vec<FieldMessage>,
    pub record: Option<T>,
    pub records: Vec<T>,
    /// Server-reported total; falls back to the number of records held.
    pub record_count: u64,
    pub selected_record: Option<T>,
    pub selected_index: Option<usize>,
    pub current_page: u32,
    pub page_size: u32,
    pub scroll_window: u32,
    pub navigator: ListNavigator,
    /// Master record scoping this list, as sent by the master view.
    pub master_key_record: Option<Value>,
    /// Key derived from `master_key_record`.
    pub master_key: Option<Key>,
    pub edit_mode: bool,
    /// Lookup lists and other values shared with the view.
    pub shared_object: Map<String, Value>,
    pub keyword: Option<String>,
    pub request_progress: Option<Progress>,
}

impl<T> ObserverState<T> {
    fn initial(options: &ObserverOptions) -> Self {
        Self {
            processing: false,
            form_processing: false,
            result_message: String::new(),
            form_result_message: String::new(),
            errors: Vec::new(),
            record: None,
            records: Vec::new(),
            record_count: 0,
            selected_record: None,
            selected_index: None,
            current_page: 1,
            page_size: options.page_size,
            scroll_window: options.scroll_window,
            navigator: ListNavigator::new(1, options.page_size, 0, options.scroll_window),
            master_key_record: None,
            master_key: None,
            edit_mode: false,
            shared_object: Map::new(),
            keyword: None,
            request_progress: None,
        }
    }
}

// ── Capabilities ─────────────────────────────────────────────────────

/// Busy flags, messages and errors.
pub trait ActivityState {
    fn processing(&self) -> bool;
    fn result_message(&self) -> String;
    fn errors(&self) -> Vec<FieldMessage>;
}

/// A single record being viewed or edited.
pub trait RecordState<T> {
    fn record(&self) -> Option<T>;
    /// Load `record` into the form and switch to edit mode.
    fn edit_record(&self, record: T);
    /// Empty the form and leave edit mode.
    fn reset_form(&self);
}

/// An ordered record list. All lookups are linear and match by key.
pub trait ListState<T> {
    fn records(&self) -> Vec<T>;
    fn insert(&self, record: T, placement: Placement);
    /// Replace the first record with the same key. `false` if none matched.
    fn replace_by_key(&self, record: &T) -> bool;
    /// Remove the first record with the same key. `false` if none matched.
    fn remove_by_key(&self, record: &T) -> bool;
    fn select_record(&self, index: usize) -> Option<T>;
    /// Select the first record with the same key, returning its index.
    fn select_by_key(&self, record: &T) -> Option<usize>;
    fn clear_list(&self);
}

pub trait PaginationState {
    fn current_page(&self) -> u32;
    fn page_size(&self) -> u32;
    fn navigator(&self) -> ListNavigator;
    fn set_page_size(&self, size: u32);
}

/// Scoping of a detail list by its master record.
pub trait MasterDetailState {
    fn master_key(&self) -> Option<Key>;
    fn master_key_record(&self) -> Option<Value>;
    /// Store a new master record, keyed by [`Entity::key`] of `record`.
    /// Returns `false` when that key was already current.
    fn set_master<M: Entity + Serialize>(&self, record: Option<&M>) -> bool;
}

// ── Observer ─────────────────────────────────────────────────────────

pub struct Observer<T: Entity> {
    state: watch::Sender<ObserverState<T>>,
    messages: RwLock<MessageRepository>,
    options: ObserverOptions,
}

impl<T: Entity> Default for Observer<T> {
    fn default() -> Self {
        Self::new(ObserverOptions::default(), MessageRepository::default())
    }
}

impl<T: Entity> Observer<T> {
    pub fn new(options: ObserverOptions, messages: MessageRepository) -> Self {
        let (state, _) = watch::channel(ObserverState::initial(&options));
        Self {
            state,
            messages: RwLock::new(messages),
            options,
        }
    }

    pub fn options(&self) -> ObserverOptions {
        self.options
    }

    pub fn snapshot(&self) -> ObserverState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream<T> {
        StateStream::new(self.state.subscribe())
    }

    pub fn messages(&self) -> MessageRepository {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_messages(&self, messages: MessageRepository) {
        *self.messages.write().unwrap_or_else(PoisonError::into_inner) = messages;
    }

    fn message(&self, key: &str) -> String {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .to_owned()
    }

    pub fn keyword(&self) -> Option<String> {
        self.state.borrow().keyword.clone()
    }

    pub fn set_keyword(&self, keyword: Option<String>) {
        self.state.send_modify(|s| s.keyword = keyword);
    }

    pub fn shared(&self, name: &str) -> Option<Value> {
        self.state.borrow().shared_object.get(name).cloned()
    }

    pub fn set_shared(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.state.send_modify(|s| {
            s.shared_object.insert(name, value);
        });
    }

    // ── Event projection ─────────────────────────────────────────────

    /// Project the non-terminal phases of a call.
    pub fn apply_request(&self, event: &RequestEvent) {
        match event {
            RequestEvent::Before { call } => self.display_processing(call),
            RequestEvent::Progress { progress, .. } => self.display_progress(*progress),
            RequestEvent::After { .. } | RequestEvent::Fail { .. } => {}
        }
    }

    /// Project a processed outcome.
    pub fn apply(&self, event: &ProcessorEvent<T>) {
        match event {
            ProcessorEvent::Errors { call, errors, .. } => self.display_errors(call, errors),
            ProcessorEvent::Record { call, record, .. } => {
                self.display_record(call, record.clone());
            }
            ProcessorEvent::Records {
                call,
                records,
                total,
                ..
            } => self.display_records(call, records.clone(), *total),
            ProcessorEvent::Fail { call, failure } => self.display_failure(call, failure),
        }
    }

    pub fn display_processing(&self, call: &CallInfo) {
        let text = self.message(messages::PROCESSING);
        let form = !call.verb.is_list_shaped();
        self.state.send_modify(|s| {
            s.processing = true;
            s.result_message.clone_from(&text);
            s.errors.clear();
            s.request_progress = None;
            if form {
                s.form_processing = true;
                s.form_result_message = text;
            }
        });
    }

    pub fn display_progress(&self, progress: Progress) {
        self.state.send_modify(|s| {
            s.request_progress = Some(progress);
            s.form_result_message = format!("{}%", progress.percent);
        });
    }

    /// Store a single-record result and apply it to the list.
    pub fn display_record(&self, call: &CallInfo, record: Option<T>) {
        let success = self.success_text();
        let no_record = self.message(messages::NO_RECORD);
        let placement = self.options.placement;
        self.state.send_modify(|s| {
            s.processing = false;
            s.form_processing = false;
            let clean = s.errors.is_empty();
            if clean {
                s.result_message.clone_from(&success);
                s.form_result_message = if record.is_some() { success } else { no_record };
            }
            let Some(record) = record else {
                s.record = None;
                return;
            };
            match call.verb {
                Verb::Create => {
                    place(&mut s.records, record.clone(), placement);
                    s.record = Some(record);
                }
                Verb::Update => {
                    replace_first(&mut s.records, &record);
                    s.record = Some(record);
                }
                Verb::Delete => {
                    remove_first(&mut s.records, &record);
                    if same_key(s.selected_record.as_ref(), &record) {
                        s.selected_record = None;
                        s.selected_index = None;
                    }
                    s.record = None;
                    s.edit_mode = false;
                }
                _ => s.record = Some(record),
            }
        });
    }

    /// Store a list result and recompute paging.
    pub fn display_records(&self, call: &CallInfo, records: Vec<T>, total: Option<u64>) {
        let fill_mode = self.options.fill_mode;
        let messages = self.messages();
        self.state.send_modify(|s| {
            let page = call.input.page.unwrap_or(s.current_page).max(1);
            let size = call.input.size.unwrap_or(s.page_size).max(1);
            match fill_mode {
                FillMode::Replace => s.records = records,
                FillMode::Continue => {
                    let keep = size as usize * (page as usize - 1);
                    s.records.truncate(keep);
                    s.records.extend(records);
                }
            }
            s.processing = false;
            s.record_count = total.unwrap_or(s.records.len() as u64);
            s.current_page = page;
            s.page_size = size;
            s.navigator = ListNavigator::new(page, size, s.record_count, s.scroll_window);
            s.selected_record = None;
            s.selected_index = None;
            s.result_message =
                messages.found_summary(s.record_count, page, s.navigator.total_pages());
        });
        trace!(id = %call.id, "list state updated");
    }

    pub fn display_errors(&self, call: &CallInfo, errors: &ErrorReport) {
        let text = self.failure_text(call.verb);
        let form = !call.verb.is_list_shaped();
        let messages = errors.messages();
        self.state.send_modify(|s| {
            s.processing = false;
            s.form_processing = false;
            s.errors.extend(messages);
            s.result_message.clone_from(&text);
            if form {
                s.form_result_message = text;
            }
        });
    }

    pub fn display_failure(&self, call: &CallInfo, failure: &TransportFailure) {
        let text = self.failure_text(call.verb);
        let form = !call.verb.is_list_shaped();
        let detail = failure.to_string();
        self.state.send_modify(|s| {
            s.processing = false;
            s.form_processing = false;
            s.request_progress = None;
            s.errors = vec![FieldMessage {
                err_field: String::new(),
                err_message: detail,
            }];
            s.result_message.clone_from(&text);
            if form {
                s.form_result_message = text;
            }
        });
    }

    fn success_text(&self) -> String {
        match self.options.message_style {
            MessageStyle::Standard => self.message(messages::SUCCESS),
            MessageStyle::Brief => self.message(messages::SAVED),
        }
    }

    fn failure_text(&self, verb: Verb) -> String {
        match self.options.message_style {
            MessageStyle::Brief => self.message(messages::FAILED),
            MessageStyle::Standard if verb.is_list_shaped() => {
                self.message(messages::LIST_LOAD_ERROR)
            }
            MessageStyle::Standard => self.message(messages::ERROR),
        }
    }
}

// ── List helpers ─────────────────────────────────────────────────────

fn same_key<T: Entity>(candidate: Option<&T>, record: &T) -> bool {
    match (candidate.and_then(Entity::key), record.key()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn position<T: Entity>(records: &[T], record: &T) -> Option<usize> {
    records.iter().position(|r| same_key(Some(r), record))
}

fn place<T>(records: &mut Vec<T>, record: T, placement: Placement) {
    match placement {
        Placement::First => records.insert(0, record),
        Placement::Last => records.push(record),
    }
}

fn replace_first<T: Entity>(records: &mut [T], record: &T) -> bool {
    match position(records, record) {
        Some(i) => {
            records[i] = record.clone();
            true
        }
        None => false,
    }
}

fn remove_first<T: Entity>(records: &mut Vec<T>, record: &T) -> bool {
    match position(records, record) {
        Some(i) => {
            records.remove(i);
            true
        }
        None => false,
    }
}

// ── Capability impls ─────────────────────────────────────────────────

impl<T: Entity> ActivityState for Observer<T> {
    fn processing(&self) -> bool {
        let s = self.state.borrow();
        s.processing || s.form_processing
    }

    fn result_message(&self) -> String {
        self.state.borrow().result_message.clone()
    }

    fn errors(&self) -> Vec<FieldMessage> {
        self.state.borrow().errors.clone()
    }
}

impl<T: Entity> RecordState<T> for Observer<T> {
    fn record(&self) -> Option<T> {
        self.state.borrow().record.clone()
    }

    fn edit_record(&self, record: T) {
        let text = self.message(messages::EDIT);
        self.state.send_modify(|s| {
            s.record = Some(record);
            s.edit_mode = true;
            s.errors.clear();
            s.form_result_message = text;
        });
    }

    fn reset_form(&self) {
        let text = self.message(messages::NEW);
        self.state.send_modify(|s| {
            s.record = None;
            s.edit_mode = false;
            s.errors.clear();
            s.form_result_message = text;
        });
    }
}

impl<T: Entity> ListState<T> for Observer<T> {
    fn records(&self) -> Vec<T> {
        self.state.borrow().records.clone()
    }

    fn insert(&self, record: T, placement: Placement) {
        self.state
            .send_modify(|s| place(&mut s.records, record, placement));
    }

    fn replace_by_key(&self, record: &T) -> bool {
        let mut replaced = false;
        self.state
            .send_modify(|s| replaced = replace_first(&mut s.records, record));
        replaced
    }

    fn remove_by_key(&self, record: &T) -> bool {
        let mut removed = false;
        self.state
            .send_modify(|s| removed = remove_first(&mut s.records, record));
        removed
    }

    fn select_record(&self, index: usize) -> Option<T> {
        let mut selected = None;
        self.state.send_modify(|s| {
            selected = s.records.get(index).cloned();
            s.selected_index = selected.as_ref().map(|_| index);
            s.selected_record.clone_from(&selected);
        });
        selected
    }

    fn select_by_key(&self, record: &T) -> Option<usize> {
        let index = position(&self.state.borrow().records, record)?;
        self.select_record(index).map(|_| index)
    }

    fn clear_list(&self) {
        self.state.send_modify(|s| {
            s.records.clear();
            s.record_count = 0;
            s.current_page = 1;
            s.selected_record = None;
            s.selected_index = None;
            s.navigator = ListNavigator::new(1, s.page_size, 0, s.scroll_window);
        });
    }
}

impl<T: Entity> PaginationState for Observer<T> {
    fn current_page(&self) -> u32 {
        self.state.borrow().current_page
    }

    fn page_size(&self) -> u32 {
        self.state.borrow().page_size
    }

    fn navigator(&self) -> ListNavigator {
        self.state.borrow().navigator.clone()
    }

    fn set_page_size(&self, size: u32) {
        self.state.send_modify(|s| {
            s.page_size = size.max(1);
            s.navigator =
                ListNavigator::new(s.current_page, s.page_size, s.record_count, s.scroll_window);
        });
    }
}

impl<T: Entity> MasterDetailState for Observer<T> {
    fn master_key(&self) -> Option<Key> {
        self.state.borrow().master_key.clone()
    }

    fn master_key_record(&self) -> Option<Value> {
        self.state.borrow().master_key_record.clone()
    }

    fn set_master<M: Entity + Serialize>(&self, record: Option<&M>) -> bool {
        let key = record.and_then(Entity::key);
        let value = record.and_then(|r| match serde_json::to_value(r) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "master record is not serializable");
                None
            }
        });
        let mut changed = false;
        self.state.send_if_modified(|s| {
            changed = s.master_key != key;
            if !changed && s.master_key_record == value {
                return false;
            }
            s.master_key = key;
            s.master_key_record = value;
            true
        });
        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::controller::RequestInput;
    use crate::event::RequestId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(verb: Verb, input: RequestInput) -> CallInfo {
        CallInfo {
            id: RequestId(1),
            verb,
            request: verb.segment().into(),
            key: None,
            input: Arc::new(input),
        }
    }

    fn rec(id: u64) -> Value {
        json!({"id": id, "name": format!("r{id}")})
    }

    #[test]
    fn list_result_sets_count_page_and_summary() {
        let observer = Observer::<Value>::default();
        observer.display_processing(&call(Verb::List, RequestInput::new()));
        assert!(observer.snapshot().processing);

        observer.display_records(
            &call(Verb::List, RequestInput::new().page(2).size(10)),
            vec![rec(11), rec(12)],
            Some(23),
        );
        let s = observer.snapshot();
        assert!(!s.processing);
        assert_eq!(s.record_count, 23);
        assert_eq!(s.records.len(), 2);
        assert_eq!(s.current_page, 2);
        assert_eq!(s.navigator.total_pages(), 3);
        assert_eq!(s.result_message, "Found 23 Record(s) Displaying Page 2 Of 3");
    }

    #[test]
    fn count_falls_back_to_record_len() {
        let observer = Observer::<Value>::default();
        observer.display_records(&call(Verb::ListAll, RequestInput::new()), vec![rec(1)], None);
        assert_eq!(observer.snapshot().record_count, 1);
    }

    #[test]
    fn continue_mode_appends_and_truncates() {
        let observer = Observer::<Value>::new(
            ObserverOptions {
                page_size: 2,
                fill_mode: FillMode::Continue,
                ..ObserverOptions::default()
            },
            MessageRepository::default(),
        );
        let page = |n: u32| call(Verb::List, RequestInput::new().page(n).size(2));
        observer.display_records(&page(1), vec![rec(1), rec(2)], Some(6));
        observer.display_records(&page(2), vec![rec(3), rec(4)], Some(6));
        assert_eq!(observer.records().len(), 4);
        observer.display_records(&page(2), vec![rec(5)], Some(6));
        let ids: Vec<u64> = observer
            .records()
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 5]);
    }

    #[test]
    fn insert_then_remove_restores_list() {
        let observer = Observer::<Value>::default();
        observer.display_records(
            &call(Verb::List, RequestInput::new()),
            vec![rec(1), rec(2)],
            None,
        );
        let before = observer.records();
        observer.insert(rec(9), Placement::First);
        assert_eq!(observer.records()[0], rec(9));
        assert!(observer.remove_by_key(&rec(9)));
        assert_eq!(observer.records(), before);
        assert!(!observer.remove_by_key(&rec(9)));
    }

    #[test]
    fn replace_matches_first_key_only() {
        let observer = Observer::<Value>::default();
        observer.insert(rec(1), Placement::Last);
        observer.insert(json!({"id": 1, "name": "dup"}), Placement::Last);
        assert!(observer.replace_by_key(&json!({"id": 1, "name": "new"})));
        let names: Vec<String> = observer
            .records()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["new", "dup"]);
    }

    #[test]
    fn create_update_delete_apply_to_list() {
        let observer = Observer::<Value>::default();
        observer.display_record(&call(Verb::Create, RequestInput::new()), Some(rec(1)));
        observer.display_record(&call(Verb::Create, RequestInput::new()), Some(rec(2)));
        assert_eq!(observer.records(), vec![rec(2), rec(1)]);

        let renamed = json!({"id": 1, "name": "renamed"});
        observer.display_record(&call(Verb::Update, RequestInput::new()), Some(renamed.clone()));
        assert_eq!(observer.records()[1], renamed);
        assert_eq!(observer.record(), Some(renamed));

        observer.display_record(&call(Verb::Delete, RequestInput::new()), Some(rec(2)));
        assert_eq!(observer.records().len(), 1);
        assert_eq!(observer.record(), None);
    }

    #[test]
    fn errors_leave_record_untouched() {
        let observer = Observer::<Value>::default();
        observer.edit_record(rec(1));
        let create = call(Verb::Create, RequestInput::new());
        observer.display_processing(&create);
        observer.display_errors(
            &create,
            &ErrorReport::Fields(vec![FieldMessage {
                err_field: "name".into(),
                err_message: "required".into(),
            }]),
        );
        let s = observer.snapshot();
        assert_eq!(s.record, Some(rec(1)));
        assert_eq!(s.errors.len(), 1);
        assert_eq!(s.errors[0].err_field, "name");
        assert!(!s.processing);
        assert!(s.form_result_message.contains("failed"));
    }

    #[test]
    fn absent_record_says_no_record_found() {
        let observer = Observer::<Value>::default();
        observer.display_record(&call(Verb::Read, RequestInput::new()), None);
        assert_eq!(observer.snapshot().form_result_message, "No record found.");
    }

    #[test]
    fn brief_style_uses_short_texts() {
        let observer = Observer::<Value>::new(
            ObserverOptions {
                message_style: MessageStyle::Brief,
                ..ObserverOptions::default()
            },
            MessageRepository::default(),
        );
        observer.display_record(&call(Verb::Update, RequestInput::new()), Some(rec(1)));
        let s = observer.snapshot();
        assert_eq!(s.result_message, "Save");
        assert_eq!(s.form_result_message, "Save");
    }

    #[test]
    fn progress_shows_percentage() {
        let observer = Observer::<Value>::default();
        observer.display_progress(Progress::new(1, 4));
        let s = observer.snapshot();
        assert_eq!(s.form_result_message, "25%");
        assert_eq!(s.request_progress.map(|p| p.percent), Some(25));
    }

    #[test]
    fn master_key_changes_once() {
        let observer = Observer::<Value>::default();
        let master = json!({"id": 7, "name": "customer"});
        assert!(observer.set_master(Some(&master)));
        assert!(!observer.set_master(Some(&master)));
        assert_eq!(observer.master_key(), Some(Key::from("7")));
        assert_eq!(observer.master_key_record(), Some(master));

        // Same key, edited record: no refetch, but the stored copy follows.
        let renamed = json!({"id": 7, "name": "renamed"});
        assert!(!observer.set_master(Some(&renamed)));
        assert_eq!(observer.master_key_record(), Some(renamed));

        assert!(observer.set_master(None::<&Value>));
        assert_eq!(observer.master_key(), None);
        assert_eq!(observer.master_key_record(), None);
    }

    #[test]
    fn selection_tracks_index() {
        let observer = Observer::<Value>::default();
        observer.insert(rec(1), Placement::Last);
        observer.insert(rec(2), Placement::Last);
        assert_eq!(observer.select_by_key(&rec(2)), Some(1));
        assert_eq!(observer.snapshot().selected_record, Some(rec(2)));
        assert_eq!(observer.select_record(5), None);
        assert_eq!(observer.snapshot().selected_index, None);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let observer = Observer::<Value>::default();
        let mut stream = observer.subscribe();
        observer.set_keyword(Some("acme".into()));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.keyword.as_deref(), Some("acme"));
    }
}
