//! Session identity and store access.
//!
//! The session store is handed to the dashboard explicitly through
//! [`SessionContext`]; nothing else in the core touches it.

use crate::collaborators::SessionStore;
use crate::config::DashboardConfig;
use crate::error::StoreError;
use crate::{DeskError, DeskResult};
use std::fmt;
use std::sync::Arc;

/// Display name of the signed-in specialist.
///
/// Always trimmed and non-empty; a blank stored name counts as no identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    pub fn new(input: impl AsRef<str>) -> DeskResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DeskError::InvalidInput("display name cannot be empty".into()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header greeting, e.g. `Bienvenue, Dr. Haddad`.
    pub fn greeting(&self) -> String {
        format!("Bienvenue, Dr. {}", self.0)
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    user_name_key: String,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, cfg: &DashboardConfig) -> Self {
        Self {
            store,
            user_name_key: cfg.user_name_key().to_string(),
        }
    }

    /// Reads the display name. Store failures are logged and treated as absent.
    pub async fn identity(&self) -> Option<SessionIdentity> {
        match self.store.get(&self.user_name_key).await {
            Ok(Some(name)) => SessionIdentity::new(name).ok(),
            Ok(None) => None,
            Err(err) => {
                tracing::error!(error = %err, "error loading user data");
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    #[test]
    fn test_identity_trims_and_rejects_blank() {
        assert_eq!(SessionIdentity::new("  Haddad ").unwrap().as_str(), "Haddad");
        assert!(SessionIdentity::new("   ").is_err());
    }

    #[test]
    fn test_greeting() {
        let identity = SessionIdentity::new("Haddad").unwrap();
        assert_eq!(identity.greeting(), "Bienvenue, Dr. Haddad");
    }

    #[tokio::test]
    async fn test_identity_reads_configured_key() {
        let store = Arc::new(MemoryStore::with(&[("userName", "Haddad")]));
        let session = SessionContext::new(store, &DashboardConfig::default());

        assert_eq!(
            session.identity().await,
            Some(SessionIdentity::new("Haddad").unwrap())
        );
    }

    #[tokio::test]
    async fn test_missing_or_blank_name_is_no_identity() {
        let cfg = DashboardConfig::default();
        let empty = SessionContext::new(Arc::new(MemoryStore::default()), &cfg);
        let blank = SessionContext::new(Arc::new(MemoryStore::with(&[("userName", " ")])), &cfg);

        assert_eq!(empty.identity().await, None);
        assert_eq!(blank.identity().await, None);
    }

    #[tokio::test]
    async fn test_store_failure_is_no_identity() {
        let session = SessionContext::new(
            Arc::new(MemoryStore::failing_get()),
            &DashboardConfig::default(),
        );

        assert_eq!(session.identity().await, None);
    }
}
