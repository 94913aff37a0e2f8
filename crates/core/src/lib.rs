//! # NeuroDesk Core
//!
//! Refresh and notification controller behind the specialist's forms dashboard.
//!
//! This crate contains the screen's recurring logic only:
//! - Loading the forms list for the selected filter, discarding superseded responses
//! - Polling unread chat counts for every visible form, with synchronous cancellation
//! - Detecting an expired session mid-fetch and redirecting to login exactly once
//! - Logout with confirmation
//!
//! **No I/O concerns**: HTTP clients, the on-disk session store and terminal rendering belong
//! in `neurodesk-client` and the binaries. The core reaches them through the traits in
//! [`collaborators`].

pub mod collaborators;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod form;
pub mod loader;
pub mod poller;
pub mod session;
pub mod view;

#[cfg(test)]
mod test_support;

pub use collaborators::{
    ActionStyle, FormsDirectory, MessagingDirectory, Navigator, Prompt, PromptAction,
    PromptChoice, Prompter, Route, SessionStore,
};
pub use config::DashboardConfig;
pub use dashboard::{Collaborators, DashboardChanges, DashboardController, LogoutOutcome};
pub use error::{DeskError, DeskResult, FetchError, StoreError};
pub use form::{DoctorId, FilterState, FormId, FormStatus, FormSummary};
pub use loader::{FilteredFormsLoader, LoadOutcome, LoaderState};
pub use poller::{PollToken, UnreadCountPoller, UnreadCounts};
pub use session::{SessionContext, SessionIdentity};
pub use view::{CardView, DashboardView, FilterButton, UnreadBadge};
