//! Health status types shared by fixtures and parsed tool output

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Assessed health of a resource
///
/// Codes outside the fixed set are kept verbatim in `Other` so that
/// whatever the CLI prints can be compared against what the fixture expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthStatusCode {
    /// Health assessment failed and the actual status is unknown
    Unknown,
    /// Not healthy yet, but may still reach a healthy state
    Progressing,
    Healthy,
    /// Resource is suspended or paused, e.g. a suspended CronJob
    Suspended,
    /// Resource reports failure or did not become healthy in time
    Degraded,
    /// Resource is missing in the cluster
    Missing,
    Other(String),
}

impl HealthStatusCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "Unknown",
            Self::Progressing => "Progressing",
            Self::Healthy => "Healthy",
            Self::Suspended => "Suspended",
            Self::Degraded => "Degraded",
            Self::Missing => "Missing",
            Self::Other(code) => code,
        }
    }

    /// Whether this is one of the six codes Argo CD defines
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for HealthStatusCode {
    fn from(s: &str) -> Self {
        match s {
            "Unknown" => Self::Unknown,
            "Progressing" => Self::Progressing,
            "Healthy" => Self::Healthy,
            "Suspended" => Self::Suspended,
            "Degraded" => Self::Degraded,
            "Missing" => Self::Missing,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for HealthStatusCode {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<HealthStatusCode> for String {
    fn from(code: HealthStatusCode) -> Self {
        match code {
            HealthStatusCode::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HealthStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health assessment result
///
/// Empty strings count as absent, both in fixtures and in parsed output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_code"
    )]
    pub status: Option<HealthStatusCode>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_message"
    )]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn new(status: impl Into<HealthStatusCode>, message: Option<&str>) -> Self {
        Self {
            status: Some(status.into()),
            message: message.and_then(non_empty),
        }
    }

    pub fn set_status(&mut self, value: &str) {
        self.status = non_empty(value).map(HealthStatusCode::from);
    }

    pub fn set_message(&mut self, value: &str) {
        self.message = non_empty(value);
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Some(status) => write!(f, "status={status}")?,
            None => f.write_str("status=<none>")?,
        }
        match &self.message {
            Some(message) => write!(f, " message={message:?}"),
            None => f.write_str(" message=<none>"),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn deserialize_code<'de, D>(deserializer: D) -> Result<Option<HealthStatusCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(HealthStatusCode::from))
}

fn deserialize_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}
