//! View model handed to whatever renders the dashboard.

use crate::constants::{UNREAD_BADGE_MAX, UNREAD_OVERFLOW_LABEL};
use crate::form::{FilterState, FormId};
use crate::loader::LoaderState;
use crate::poller::UnreadCounts;
use crate::session::SessionIdentity;
use chrono::{DateTime, Utc};
use std::fmt;

/// Unread badge on a form card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadBadge {
    /// No unread messages: no badge at all.
    Hidden,
    /// 1 to 9 unread messages, shown as the digit.
    Count(u32),
    /// More than 9 unread messages, shown as `9+`.
    Overflow,
}

impl UnreadBadge {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => Self::Hidden,
            n if n <= UNREAD_BADGE_MAX => Self::Count(n),
            _ => Self::Overflow,
        }
    }

    /// Text to draw inside the badge, `None` when no badge is drawn.
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Hidden => None,
            Self::Count(n) => Some(n.to_string()),
            Self::Overflow => Some(UNREAD_OVERFLOW_LABEL.to_string()),
        }
    }
}

impl fmt::Display for UnreadBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(&label),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterButton {
    pub filter: FilterState,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub form_id: FormId,
    pub title: String,
    pub subtitle: String,
    pub badge: UnreadBadge,
}

/// Everything the screen needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub filter: FilterState,
    pub header_title: &'static str,
    pub greeting: Option<String>,
    pub filters: Vec<FilterButton>,
    pub cards: Vec<CardView>,
    /// Set only when the list is empty and nothing is loading.
    pub empty_message: Option<&'static str>,
    pub loading: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl DashboardView {
    pub fn compose(
        state: &LoaderState,
        counts: &UnreadCounts,
        identity: Option<&SessionIdentity>,
    ) -> Self {
        let filters = FilterState::ALL_FILTERS
            .into_iter()
            .map(|filter| FilterButton {
                filter,
                label: filter.label(),
                active: filter == state.filter,
            })
            .collect();

        let cards = state
            .forms
            .iter()
            .map(|form| CardView {
                form_id: form.form_id,
                title: form.title(),
                subtitle: form.subtitle(),
                badge: counts.badge(form.form_id),
            })
            .collect::<Vec<_>>();

        let empty_message = (cards.is_empty() && !state.loading).then(|| state.filter.empty_message());

        Self {
            filter: state.filter,
            header_title: state.filter.header_title(),
            greeting: identity.map(SessionIdentity::greeting),
            filters,
            cards,
            empty_message,
            loading: state.loading,
            loaded_at: state.loaded_at,
        }
    }
}
