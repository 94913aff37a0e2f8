//! Interfaces of the services the dashboard consumes.
//!
//! The core never talks to the network, the key-value store or the screen
//! stack directly; it goes through these traits. Implementations live in
//! `neurodesk-client` (HTTP, file store) and in the binaries (terminal
//! navigator and prompter).

use crate::error::{FetchError, StoreError};
use crate::form::{FormId, FormSummary};
use async_trait::async_trait;
use serde_json::Value;

/// Remote source of form lists.
#[async_trait]
pub trait FormsDirectory: Send + Sync {
    async fn fetch_pending(&self) -> Result<Vec<FormSummary>, FetchError>;
    async fn fetch_completed(&self) -> Result<Vec<FormSummary>, FetchError>;
    async fn fetch_all(&self) -> Result<Vec<FormSummary>, FetchError>;
}

/// Remote source of chat unread counts.
#[async_trait]
pub trait MessagingDirectory: Send + Sync {
    async fn count_unread(&self, form_id: FormId) -> Result<u32, FetchError>;
}

/// Key-value store holding the authenticated session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// A screen plus the opaque parameters handed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub screen: String,
    pub params: Value,
}

impl Route {
    pub fn new(screen: impl Into<String>, params: Value) -> Self {
        Self {
            screen: screen.into(),
            params,
        }
    }

    pub fn bare(screen: impl Into<String>) -> Self {
        Self::new(screen, Value::Null)
    }
}

/// Screen stack of the host application.
pub trait Navigator: Send + Sync {
    /// Replace the current screen; there is no way back to the replaced one.
    fn replace_screen(&self, route: Route);
    /// Push a screen on top of the current one.
    fn navigate_to(&self, route: Route);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStyle {
    Default,
    Cancel,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAction {
    pub label: String,
    pub style: ActionStyle,
}

/// A modal question shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub actions: Vec<PromptAction>,
}

impl Prompt {
    /// Single-button alert.
    pub fn alert(title: &str, message: &str, ok_label: &str) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            actions: vec![PromptAction {
                label: ok_label.into(),
                style: ActionStyle::Default,
            }],
        }
    }

    /// Cancel / destructive-confirm pair.
    pub fn destructive(title: &str, message: &str, cancel_label: &str, confirm_label: &str) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            actions: vec![
                PromptAction {
                    label: cancel_label.into(),
                    style: ActionStyle::Cancel,
                },
                PromptAction {
                    label: confirm_label.into(),
                    style: ActionStyle::Destructive,
                },
            ],
        }
    }
}

/// What the user answered. Single-button alerts always come back as `Confirm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Confirm,
    Cancel,
}

/// Shows prompts and waits for the user's answer.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn confirm(&self, prompt: &Prompt) -> PromptChoice;
}
