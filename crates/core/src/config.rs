//! Dashboard runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the
//! controller, so nothing in the core reads environment variables while the
//! dashboard is running.

use crate::constants::{
    CHAT_SCREEN, DEFAULT_UNREAD_POLL_INTERVAL, FORM_DETAILS_SCREEN, LOGIN_SCREEN, USER_NAME_KEY,
};
use crate::{DeskError, DeskResult};
use std::time::Duration;

/// Dashboard configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    unread_poll_interval: Duration,
    login_screen: String,
    form_details_screen: String,
    chat_screen: String,
    user_name_key: String,
}

impl DashboardConfig {
    /// Create a new `DashboardConfig`.
    ///
    /// # Errors
    /// Returns [`DeskError::InvalidInput`] if the poll interval is zero or any
    /// screen name or key is blank.
    pub fn new(
        unread_poll_interval: Duration,
        login_screen: String,
        form_details_screen: String,
        chat_screen: String,
        user_name_key: String,
    ) -> DeskResult<Self> {
        if unread_poll_interval.is_zero() {
            return Err(DeskError::InvalidInput(
                "unread_poll_interval must be greater than zero".into(),
            ));
        }

        for (field, value) in [
            ("login_screen", &login_screen),
            ("form_details_screen", &form_details_screen),
            ("chat_screen", &chat_screen),
            ("user_name_key", &user_name_key),
        ] {
            if value.trim().is_empty() {
                return Err(DeskError::InvalidInput(format!("{field} cannot be empty")));
            }
        }

        Ok(Self {
            unread_poll_interval,
            login_screen,
            form_details_screen,
            chat_screen,
            user_name_key,
        })
    }

    /// Same as [`DashboardConfig::default`] with a custom poll interval.
    pub fn with_poll_interval(unread_poll_interval: Duration) -> DeskResult<Self> {
        let defaults = Self::default();
        Self::new(
            unread_poll_interval,
            defaults.login_screen,
            defaults.form_details_screen,
            defaults.chat_screen,
            defaults.user_name_key,
        )
    }

    pub fn unread_poll_interval(&self) -> Duration {
        self.unread_poll_interval
    }

    pub fn login_screen(&self) -> &str {
        &self.login_screen
    }

    pub fn form_details_screen(&self) -> &str {
        &self.form_details_screen
    }

    pub fn chat_screen(&self) -> &str {
        &self.chat_screen
    }

    pub fn user_name_key(&self) -> &str {
        &self.user_name_key
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            unread_poll_interval: DEFAULT_UNREAD_POLL_INTERVAL,
            login_screen: LOGIN_SCREEN.into(),
            form_details_screen: FORM_DETAILS_SCREEN.into(),
            chat_screen: CHAT_SCREEN.into(),
            user_name_key: USER_NAME_KEY.into(),
        }
    }
}

/// Parse the unread poll interval from an optional seconds value.
///
/// If `value` is `None` or blank, returns the default interval.
pub fn poll_interval_from_env_value(value: Option<String>) -> DeskResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(raw) = value else {
        return Ok(DEFAULT_UNREAD_POLL_INTERVAL);
    };

    let secs = raw
        .parse::<u64>()
        .map_err(|_| DeskError::InvalidInput(format!("invalid poll interval seconds: {raw}")))?;
    if secs == 0 {
        return Err(DeskError::InvalidInput(
            "poll interval seconds must be greater than zero".into(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_polls_every_thirty_seconds() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.unread_poll_interval(), Duration::from_secs(30));
        assert_eq!(cfg.login_screen(), "NeurologueLogin");
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(DashboardConfig::with_poll_interval(Duration::ZERO).is_err());
    }

    #[test]
    fn test_rejects_blank_screen_name() {
        let result = DashboardConfig::new(
            Duration::from_secs(5),
            "  ".into(),
            FORM_DETAILS_SCREEN.into(),
            CHAT_SCREEN.into(),
            USER_NAME_KEY.into(),
        );
        match result {
            Err(DeskError::InvalidInput(msg)) => assert!(msg.contains("login_screen")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_poll_interval_from_env_value() {
        assert_eq!(
            poll_interval_from_env_value(None).unwrap(),
            DEFAULT_UNREAD_POLL_INTERVAL
        );
        assert_eq!(
            poll_interval_from_env_value(Some(" 5 ".into())).unwrap(),
            Duration::from_secs(5)
        );
        assert!(poll_interval_from_env_value(Some("0".into())).is_err());
        assert!(poll_interval_from_env_value(Some("soon".into())).is_err());
    }
}
