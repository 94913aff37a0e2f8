//! In-memory collaborators shared by the unit tests.

use crate::collaborators::{
    FormsDirectory, MessagingDirectory, Navigator, Prompt, PromptChoice, Prompter, Route,
    SessionStore,
};
use crate::error::{FetchError, StoreError};
use crate::form::{DoctorId, FilterState, FormId, FormStatus, FormSummary};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

pub(crate) fn form(id: u64, status: &str) -> FormSummary {
    FormSummary {
        form_id: FormId(id),
        patient_name: format!("Patient {id}"),
        status: FormStatus::from(status),
        referring_doctor_id: DoctorId(100 + id),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedForms {
    responses: Mutex<HashMap<FilterState, Result<Vec<FormSummary>, FetchError>>>,
    gates: Mutex<HashMap<FilterState, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<FilterState>>,
}

impl ScriptedForms {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self, filter: FilterState, response: Result<Vec<FormSummary>, FetchError>) {
        self.responses.lock().unwrap().insert(filter, response);
    }

    pub(crate) fn peek(&self, filter: FilterState) -> Vec<FormSummary> {
        match self.responses.lock().unwrap().get(&filter) {
            Some(Ok(forms)) => forms.clone(),
            _ => Vec::new(),
        }
    }

    /// Holds the next fetch for `filter` until the returned sender fires or is dropped.
    pub(crate) fn gate(&self, filter: FilterState) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(filter, rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<FilterState> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, filter: FilterState) -> Result<Vec<FormSummary>, FetchError> {
        self.calls.lock().unwrap().push(filter);
        let gate = self.gates.lock().unwrap().remove(&filter);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(&filter)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl FormsDirectory for ScriptedForms {
    async fn fetch_pending(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.respond(FilterState::Pending).await
    }

    async fn fetch_completed(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.respond(FilterState::Completed).await
    }

    async fn fetch_all(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.respond(FilterState::All).await
    }
}

/// Replays a per-form script of results; the last entry repeats forever.
#[derive(Default)]
pub(crate) struct ScriptedMessaging {
    scripts: Mutex<HashMap<FormId, VecDeque<Result<u32, FetchError>>>>,
    calls: Mutex<HashMap<FormId, usize>>,
    delay: Option<Duration>,
}

impl ScriptedMessaging {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn script(&self, form_id: u64, results: Vec<Result<u32, FetchError>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(FormId(form_id), results.into());
    }

    pub(crate) fn calls(&self, form_id: u64) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&FormId(form_id))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessagingDirectory for ScriptedMessaging {
    async fn count_unread(&self, form_id: FormId) -> Result<u32, FetchError> {
        *self.calls.lock().unwrap().entry(form_id).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.entry(form_id).or_default();
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Ok(0))
        } else {
            queue.front().cloned().unwrap_or(Ok(0))
        }
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    clear_calls: Mutex<usize>,
    fail_get: bool,
    fail_clear: bool,
}

impl MemoryStore {
    pub(crate) fn with(entries: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut values = store.values.lock().unwrap();
            for (key, value) in entries {
                values.insert((*key).to_string(), (*value).to_string());
            }
        }
        store
    }

    pub(crate) fn failing_get() -> Self {
        Self {
            fail_get: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_clear(entries: &[(&str, &str)]) -> Self {
        Self {
            fail_clear: true,
            ..Self::with(entries)
        }
    }

    pub(crate) fn clear_calls(&self) -> usize {
        *self.clear_calls.lock().unwrap()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_get {
            return Err(StoreError::Unavailable("storage locked".into()));
        }
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.clear_calls.lock().unwrap() += 1;
        if self.fail_clear {
            return Err(StoreError::Unavailable("storage locked".into()));
        }
        self.values.lock().unwrap().clear();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NavigationCall {
    Replace(Route),
    Push(Route),
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    calls: Mutex<Vec<NavigationCall>>,
}

impl RecordingNavigator {
    pub(crate) fn calls(&self) -> Vec<NavigationCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn replacements(&self) -> Vec<Route> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                NavigationCall::Replace(route) => Some(route),
                NavigationCall::Push(_) => None,
            })
            .collect()
    }
}

impl Navigator for RecordingNavigator {
    fn replace_screen(&self, route: Route) {
        self.calls.lock().unwrap().push(NavigationCall::Replace(route));
    }

    fn navigate_to(&self, route: Route) {
        self.calls.lock().unwrap().push(NavigationCall::Push(route));
    }
}

pub(crate) struct ScriptedPrompter {
    answer: PromptChoice,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedPrompter {
    pub(crate) fn answering(answer: PromptChoice) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, prompt: &Prompt) -> PromptChoice {
        self.prompts.lock().unwrap().push(prompt.clone());
        tokio::task::yield_now().await;
        self.answer
    }
}
