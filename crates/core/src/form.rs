//! Form summaries and the three-way status filter.

use crate::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a patient intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FormId {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(FormId)
            .map_err(|_| DeskError::InvalidInput(format!("invalid form id: {s}")))
    }
}

/// Identifier of the doctor who referred the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(pub u64);

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review status of a form.
///
/// Statuses the dashboard does not know about are kept verbatim so they can
/// still be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Pending,
    Completed,
    Other(String),
}

impl FormStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for FormStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FormStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(FormStatus::from(raw.as_str()))
    }
}

/// One row of the dashboard list, as returned by the forms directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub form_id: FormId,
    pub patient_name: String,
    pub status: FormStatus,
    pub referring_doctor_id: DoctorId,
}

impl FormSummary {
    /// Card title, e.g. `Formulaire #7`.
    pub fn title(&self) -> String {
        format!("Formulaire #{}", self.form_id)
    }

    /// Card subtitle, e.g. `Jane Doe - pending`.
    pub fn subtitle(&self) -> String {
        format!("{} - {}", self.patient_name, self.status)
    }
}

/// Which forms the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterState {
    #[default]
    Pending,
    Completed,
    All,
}

impl FilterState {
    pub const ALL_FILTERS: [FilterState; 3] = [Self::Pending, Self::Completed, Self::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::All => "all",
        }
    }

    /// Label of the filter button.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::Completed => "Complétés",
            Self::All => "Tous",
        }
    }

    /// Screen header shown while this filter is active.
    pub fn header_title(self) -> &'static str {
        match self {
            Self::Pending => "Formulaires en attente",
            Self::Completed => "Formulaires complétés",
            Self::All => "Tous les formulaires",
        }
    }

    /// Message shown when the list for this filter is empty.
    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Pending => "Aucun formulaire en attente",
            Self::Completed => "Aucun formulaire complété",
            Self::All => "Aucun formulaire disponible",
        }
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterState {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "p" => Ok(Self::Pending),
            "completed" | "c" => Ok(Self::Completed),
            "all" | "a" => Ok(Self::All),
            other => Err(DeskError::InvalidInput(format!(
                "unknown filter '{other}' (expected pending, completed or all)"
            ))),
        }
    }
}
