//! Dashboard controller.
//!
//! Composes the forms loader, the unread poller and the session context, and
//! turns their outcomes into navigation: drill-downs, the single
//! session-expired redirect and logout.

use crate::collaborators::{
    FormsDirectory, MessagingDirectory, Navigator, Prompt, PromptChoice, Prompter, Route,
    SessionStore,
};
use crate::config::DashboardConfig;
use crate::constants::{
    ACKNOWLEDGE_LABEL, LOGOUT_CANCEL_LABEL, LOGOUT_CONFIRM_LABEL, LOGOUT_MESSAGE, LOGOUT_TITLE,
    SESSION_EXPIRED_MESSAGE, SESSION_EXPIRED_TITLE,
};
use crate::form::{FilterState, FormId};
use crate::loader::{FilteredFormsLoader, LoadOutcome, LoaderState};
use crate::poller::{UnreadCountPoller, UnreadCounts};
use crate::session::{SessionContext, SessionIdentity};
use crate::view::DashboardView;
use crate::{DeskError, DeskResult};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Services the dashboard depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub forms: Arc<dyn FormsDirectory>,
    pub messaging: Arc<dyn MessagingDirectory>,
    pub store: Arc<dyn SessionStore>,
    pub navigator: Arc<dyn Navigator>,
    pub prompter: Arc<dyn Prompter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The user backed out; nothing changed.
    Cancelled,
    /// The screen was replaced with the login screen.
    LoggedOut { store_cleared: bool },
}

struct DashboardInner {
    cfg: Arc<DashboardConfig>,
    loader: FilteredFormsLoader,
    poller: UnreadCountPoller,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
    prompter: Arc<dyn Prompter>,
    identity: watch::Sender<Option<SessionIdentity>>,
    closed: AtomicBool,
}

/// Controller behind the specialist's forms dashboard. Cheap to clone.
#[derive(Clone)]
pub struct DashboardController {
    inner: Arc<DashboardInner>,
}

impl DashboardController {
    pub fn new(cfg: Arc<DashboardConfig>, collaborators: Collaborators) -> Self {
        let (identity, _) = watch::channel(None);
        let inner = DashboardInner {
            loader: FilteredFormsLoader::new(collaborators.forms),
            poller: UnreadCountPoller::new(collaborators.messaging, cfg.unread_poll_interval()),
            session: SessionContext::new(collaborators.store, &cfg),
            navigator: collaborators.navigator,
            prompter: collaborators.prompter,
            identity,
            closed: AtomicBool::new(false),
            cfg,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Whether the dashboard has redirected away (session expiry or logout).
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn filter(&self) -> FilterState {
        self.inner.loader.current_filter()
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.inner.identity.borrow().clone()
    }

    pub fn forms(&self) -> LoaderState {
        self.inner.loader.snapshot()
    }

    pub fn unread_counts(&self) -> UnreadCounts {
        self.inner.poller.counts()
    }

    pub fn polled_forms(&self) -> Vec<FormId> {
        self.inner.poller.attached()
    }

    pub fn view(&self) -> DashboardView {
        let identity = self.identity();
        DashboardView::compose(
            &self.inner.loader.snapshot(),
            &self.inner.poller.counts(),
            identity.as_ref(),
        )
    }

    pub fn changes(&self) -> DashboardChanges {
        DashboardChanges {
            loader: self.inner.loader.subscribe(),
            counts: self.inner.poller.subscribe(),
            identity: self.inner.identity.subscribe(),
        }
    }

    /// First display: reads the identity, then loads the current filter.
    pub async fn mount(&self) -> LoadOutcome {
        let identity = self.inner.session.identity().await;
        self.inner.identity.send_replace(identity);
        self.refresh().await
    }

    /// Reloads the list for the current filter.
    pub async fn refresh(&self) -> LoadOutcome {
        self.load(self.filter()).await
    }

    pub async fn select_filter(&self, filter: FilterState) -> LoadOutcome {
        self.load(filter).await
    }

    async fn load(&self, filter: FilterState) -> LoadOutcome {
        if self.is_closed() {
            return LoadOutcome::ScreenClosed;
        }

        let outcome = self.inner.loader.load(filter).await;
        match &outcome {
            LoadOutcome::Applied { .. } | LoadOutcome::Failed(_) => {
                if !self.is_closed() {
                    let visible = self.inner.loader.snapshot().form_ids();
                    self.inner.poller.sync_visible(&visible);
                }
            }
            LoadOutcome::SessionExpired => self.expire_session().await,
            LoadOutcome::Superseded { .. } | LoadOutcome::ScreenClosed => {}
        }
        outcome
    }

    /// Shows the expiry alert once and replaces the screen with login on acknowledgment.
    async fn expire_session(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("session expiry already handled");
            return;
        }
        self.inner.poller.shut_down();

        let prompt = Prompt::alert(
            SESSION_EXPIRED_TITLE,
            SESSION_EXPIRED_MESSAGE,
            ACKNOWLEDGE_LABEL,
        );
        self.inner.prompter.confirm(&prompt).await;

        tracing::info!("session expired, redirecting to login");
        self.inner
            .navigator
            .replace_screen(Route::bare(self.inner.cfg.login_screen()));
    }

    /// Opens the detail screen of a form in the current list.
    pub fn select_form(&self, form_id: FormId) -> DeskResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        let form = self
            .inner
            .loader
            .find(form_id)
            .ok_or(DeskError::UnknownForm(form_id))?;
        let route = Route::new(
            self.inner.cfg.form_details_screen(),
            json!({ "form": form }),
        );
        self.inner.navigator.navigate_to(route);
        Ok(())
    }

    /// Opens the chat thread of a form in the current list.
    pub fn open_chat(&self, form_id: FormId) -> DeskResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        let form = self
            .inner
            .loader
            .find(form_id)
            .ok_or(DeskError::UnknownForm(form_id))?;
        let route = Route::new(
            self.inner.cfg.chat_screen(),
            json!({ "formId": form.form_id, "doctorId": form.referring_doctor_id }),
        );
        self.inner.navigator.navigate_to(route);
        Ok(())
    }

    /// The view reports a card scrolled into view.
    pub fn show_item(&self, form_id: FormId) -> DeskResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        if self.inner.loader.find(form_id).is_none() {
            return Err(DeskError::UnknownForm(form_id));
        }
        self.inner.poller.attach(form_id);
        Ok(())
    }

    /// The view reports a card scrolled out of view.
    pub fn hide_item(&self, form_id: FormId) {
        self.inner.poller.detach(form_id);
    }

    /// Asks for confirmation, then clears the session and replaces the screen with login.
    ///
    /// The redirect happens even if clearing the store fails.
    pub async fn request_logout(&self) -> LogoutOutcome {
        let prompt = Prompt::destructive(
            LOGOUT_TITLE,
            LOGOUT_MESSAGE,
            LOGOUT_CANCEL_LABEL,
            LOGOUT_CONFIRM_LABEL,
        );
        if self.inner.prompter.confirm(&prompt).await == PromptChoice::Cancel {
            return LogoutOutcome::Cancelled;
        }

        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.poller.shut_down();

        let store_cleared = match self.inner.session.clear().await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "error during logout");
                false
            }
        };
        self.inner.identity.send_replace(None);

        tracing::info!(store_cleared, "logged out, redirecting to login");
        self.inner
            .navigator
            .replace_screen(Route::bare(self.inner.cfg.login_screen()));
        LogoutOutcome::LoggedOut { store_cleared }
    }

    /// The screen goes away: stops every poller and refuses further loads and polling.
    pub fn unmount(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.poller.shut_down();
    }
}

/// Waits for any change that affects [`DashboardController::view`].
pub struct DashboardChanges {
    loader: watch::Receiver<LoaderState>,
    counts: watch::Receiver<UnreadCounts>,
    identity: watch::Receiver<Option<SessionIdentity>>,
}

impl DashboardChanges {
    /// Resolves on the next change. Returns `false` once the dashboard is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            result = self.loader.changed() => result.is_ok(),
            result = self.counts.changed() => result.is_ok(),
            result = self.identity.changed() => result.is_ok(),
        }
    }
}
