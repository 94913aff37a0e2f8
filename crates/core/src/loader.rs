//! Filter-driven loading of the forms list.
//!
//! Every call to [`FilteredFormsLoader::load`] takes a new generation number.
//! Only the load holding the current generation may replace the list or clear
//! the loading flag; results of superseded loads are discarded when they
//! arrive. In-flight requests are never cancelled.

use crate::collaborators::FormsDirectory;
use crate::error::FetchError;
use crate::form::{FilterState, FormId, FormSummary};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// State owned by the loader and observed by the view layer.
#[derive(Debug, Clone, Default)]
pub struct LoaderState {
    pub filter: FilterState,
    pub forms: Vec<FormSummary>,
    pub loading: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub(crate) generation: u64,
}

impl LoaderState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn form_ids(&self) -> Vec<FormId> {
        self.forms.iter().map(|form| form.form_id).collect()
    }

    pub fn find(&self, form_id: FormId) -> Option<&FormSummary> {
        self.forms.iter().find(|form| form.form_id == form_id)
    }
}

/// How a single load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched list replaced the displayed one.
    Applied { filter: FilterState, count: usize },
    /// A newer load started before this one finished; its result was dropped.
    Superseded { filter: FilterState },
    /// The directory reported that no authenticated identity exists.
    SessionExpired,
    /// Transient failure; the list was emptied.
    Failed(FetchError),
    /// The dashboard already redirected away; nothing was fetched.
    ScreenClosed,
}

pub struct FilteredFormsLoader {
    directory: Arc<dyn FormsDirectory>,
    state: watch::Sender<LoaderState>,
}

impl FilteredFormsLoader {
    pub fn new(directory: Arc<dyn FormsDirectory>) -> Self {
        let (state, _) = watch::channel(LoaderState::default());
        Self { directory, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LoaderState {
        self.state.borrow().clone()
    }

    pub fn current_filter(&self) -> FilterState {
        self.state.borrow().filter
    }

    pub fn find(&self, form_id: FormId) -> Option<FormSummary> {
        self.state.borrow().find(form_id).cloned()
    }

    /// Fetches the list for `filter` and, if still current, replaces the displayed list.
    ///
    /// The loading flag is raised immediately and lowered when this load completes,
    /// fails or is dropped, unless a newer load has taken over in the meantime.
    pub async fn load(&self, filter: FilterState) -> LoadOutcome {
        let generation = self.begin(filter);
        let _loading = LoadingGuard {
            state: &self.state,
            generation,
        };

        let result = match filter {
            FilterState::Pending => self.directory.fetch_pending().await,
            FilterState::Completed => self.directory.fetch_completed().await,
            FilterState::All => self.directory.fetch_all().await,
        };

        self.finish(generation, filter, result)
    }

    fn begin(&self, filter: FilterState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.filter = filter;
            state.loading = true;
            generation = state.generation;
        });
        tracing::debug!(%filter, generation, "loading forms");
        generation
    }

    fn finish(
        &self,
        generation: u64,
        filter: FilterState,
        result: Result<Vec<FormSummary>, FetchError>,
    ) -> LoadOutcome {
        match result {
            Ok(forms) => {
                let count = forms.len();
                let applied = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.forms = forms;
                    state.loaded_at = Some(Utc::now());
                    state.loading = false;
                    true
                });

                if applied {
                    tracing::info!(%filter, count, "forms loaded");
                    LoadOutcome::Applied { filter, count }
                } else {
                    tracing::debug!(%filter, generation, "discarding superseded forms response");
                    LoadOutcome::Superseded { filter }
                }
            }
            Err(FetchError::AuthRequired) => {
                tracing::warn!(%filter, "forms fetch rejected: no authenticated identity");
                LoadOutcome::SessionExpired
            }
            Err(err) => {
                tracing::warn!(%filter, error = %err, "error fetching forms");
                let current = self.state.send_if_modified(|state| {
                    if state.generation != generation {
                        return false;
                    }
                    state.forms.clear();
                    state.loading = false;
                    true
                });

                if current {
                    LoadOutcome::Failed(err)
                } else {
                    LoadOutcome::Superseded { filter }
                }
            }
        }
    }
}

/// Lowers the loading flag when a load ends on any path, including cancellation.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<LoaderState>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let generation = self.generation;
        self.state.send_if_modified(|state| {
            if state.generation == generation && state.loading {
                state.loading = false;
                true
            } else {
                false
            }
        });
    }
}
