//! HTTP implementation of the forms and messaging directories.
//!
//! Every request is made on behalf of the user id held in the session store, with the stored
//! bearer token when one is present. Failures are classified here:
//! - no user id in the session, HTTP 401 or HTTP 403 → [`FetchError::AuthRequired`]
//! - error bodies carrying the legacy identity marker → [`FetchError::AuthRequired`]
//! - everything else → [`FetchError::Transient`]

use crate::config::ClientConfig;
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use neurodesk_core::constants::{TOKEN_KEY, USER_ID_KEY};
use neurodesk_core::{FetchError, FormId, FormSummary, FormsDirectory, MessagingDirectory, SessionStore};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Credentials read from the session store for one request.
struct Credentials {
    user_id: String,
    token: Option<String>,
}

/// Unread count payload; the backend answers either with a bare number or `{"count": n}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnreadPayload {
    Bare(u32),
    Wrapped { count: u32 },
}

impl UnreadPayload {
    fn count(self) -> u32 {
        match self {
            Self::Bare(n) | Self::Wrapped { count: n } => n,
        }
    }
}

#[derive(Clone)]
pub struct ReviewApi {
    client: reqwest::Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
}

impl ReviewApi {
    pub fn new(cfg: &ClientConfig, store: Arc<dyn SessionStore>) -> ClientResult<Self> {
        let base_url = Url::parse(cfg.base_url())
            .map_err(|e| ClientError::InvalidConfig(format!("invalid API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "API URL cannot carry a path: {base_url}"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(ClientError::HttpClient)?;

        Ok(Self {
            client,
            base_url,
            store,
        })
    }

    async fn credentials(&self) -> Result<Credentials, FetchError> {
        let user_id = self
            .store
            .get(USER_ID_KEY)
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let Some(user_id) = user_id else {
            tracing::warn!("no user id in session");
            return Err(FetchError::AuthRequired);
        };

        let token = self
            .store
            .get(TOKEN_KEY)
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?
            .filter(|t| !t.trim().is_empty());

        Ok(Credentials { user_id, token })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<T, FetchError> {
        let path = url.path().to_string();
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(%status, path = %path, "backend rejected credentials");
            return Err(FetchError::AuthRequired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_message(format!("{status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Transient(format!("invalid response from {path}: {e}")))
    }

    async fn fetch_forms(&self, status: Option<&str>) -> Result<Vec<FormSummary>, FetchError> {
        let creds = self.credentials().await?;
        let mut segments = vec!["api", "neurologues", creds.user_id.as_str(), "forms"];
        segments.extend(status);
        let url = self.endpoint(&segments);
        let path = url.path().to_string();
        let forms: Vec<FormSummary> = self.get_json(url, &[], creds.token.as_deref()).await?;
        tracing::debug!(path = %path, count = forms.len(), "forms fetched");
        Ok(forms)
    }
}

#[async_trait]
impl FormsDirectory for ReviewApi {
    async fn fetch_pending(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.fetch_forms(Some("pending")).await
    }

    async fn fetch_completed(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.fetch_forms(Some("completed")).await
    }

    async fn fetch_all(&self) -> Result<Vec<FormSummary>, FetchError> {
        self.fetch_forms(None).await
    }
}

#[async_trait]
impl MessagingDirectory for ReviewApi {
    async fn count_unread(&self, form_id: FormId) -> Result<u32, FetchError> {
        let creds = self.credentials().await?;
        let form_id = form_id.to_string();
        let url = self.endpoint(&["api", "chat", "forms", &form_id, "unread"]);
        let payload: UnreadPayload = self
            .get_json(url, &[("userId", creds.user_id.as_str())], creds.token.as_deref())
            .await?;
        Ok(payload.count())
    }
}
