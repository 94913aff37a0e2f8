//! Constants used throughout the NeuroDesk core crate.
//!
//! Screen names, session-store keys and the user-facing French copy of the
//! dashboard live here so the controller and the view model agree on them.

use std::time::Duration;

/// Default interval between two unread-count fetches for a visible form.
pub const DEFAULT_UNREAD_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Largest unread count rendered as-is; anything above renders as [`UNREAD_OVERFLOW_LABEL`].
pub const UNREAD_BADGE_MAX: u32 = 9;

/// Badge label for counts above [`UNREAD_BADGE_MAX`].
pub const UNREAD_OVERFLOW_LABEL: &str = "9+";

/// Screen the dashboard redirects to on session expiry or logout.
pub const LOGIN_SCREEN: &str = "NeurologueLogin";

/// Screen showing a single form in detail.
pub const FORM_DETAILS_SCREEN: &str = "NeurologueFormDetails";

/// Screen hosting the chat thread of a form.
pub const CHAT_SCREEN: &str = "NeurologueChat";

/// Session-store key holding the specialist's display name.
pub const USER_NAME_KEY: &str = "userName";

/// Session-store key holding the authenticated user id.
pub const USER_ID_KEY: &str = "userId";

/// Session-store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Legacy failure text meaning "no authenticated identity".
pub const IDENTITY_NOT_FOUND_MARKER: &str = "User ID not found";

pub const SESSION_EXPIRED_TITLE: &str = "Session expirée";
pub const SESSION_EXPIRED_MESSAGE: &str = "Veuillez vous reconnecter.";
pub const ACKNOWLEDGE_LABEL: &str = "OK";

pub const LOGOUT_TITLE: &str = "Déconnexion";
pub const LOGOUT_MESSAGE: &str = "Êtes-vous sûr de vouloir vous déconnecter ?";
pub const LOGOUT_CANCEL_LABEL: &str = "Annuler";
pub const LOGOUT_CONFIRM_LABEL: &str = "Déconnecter";
