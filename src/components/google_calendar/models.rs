use crate::error::{validation_error, AppResult};
use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied description of a calendar entry
#[derive(Debug, Clone, PartialEq)]
pub struct EventRequest {
    summary: String,
    location: String,
    description: String,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    attendees: Vec<String>,
}

impl EventRequest {
    /// Create a request, rejecting an end that lies before the start
    pub fn new(
        summary: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
        attendees: Vec<String>,
    ) -> AppResult<Self> {
        if start > end {
            return Err(validation_error(&format!(
                "Event end {} is before its start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }

        Ok(Self {
            summary: summary.into(),
            location: location.into(),
            description: description.into(),
            start,
            end,
            attendees,
        })
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn attendees(&self) -> &[String] {
        &self.attendees
    }

    /// Build the body of an `events.insert` call
    pub fn to_payload(&self) -> EventPayload {
        EventPayload {
            summary: self.summary.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            start: EventDateTime::from(&self.start),
            end: EventDateTime::from(&self.end),
            attendees: self
                .attendees
                .iter()
                .map(|email| Attendee {
                    email: email.clone(),
                })
                .collect(),
        }
    }
}

/// Which side of the workflow failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable credential could be obtained
    Auth,
    /// The calendar API rejected or failed the insert call
    Service,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Auth => write!(f, "authorization failed"),
            FailureKind::Service => write!(f, "calendar service error"),
        }
    }
}

/// Outcome of a scheduling attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Scheduled { link: String },
    Failed { kind: FailureKind, reason: String },
}

impl EventResult {
    /// Build a failure whose reason is never empty
    pub fn failed(kind: FailureKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.trim().is_empty() {
            kind.to_string()
        } else {
            reason
        };
        EventResult::Failed { kind, reason }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, EventResult::Scheduled { .. })
    }

    /// Link to the created event, if any
    pub fn link(&self) -> Option<&str> {
        match self {
            EventResult::Scheduled { link } => Some(link),
            EventResult::Failed { .. } => None,
        }
    }
}

/// Body of the Google Calendar `events.insert` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
}

/// Timestamp with its timezone, as the calendar API expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

impl From<&DateTime<Tz>> for EventDateTime {
    fn from(dt: &DateTime<Tz>) -> Self {
        Self {
            date_time: dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: dt.timezone().name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

/// The parts of the created event we read back
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    #[serde(default)]
    pub id: String,
    pub html_link: Option<String>,
    pub status: Option<String>,
}

/// Error body returned by Google APIs
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    pub error: GoogleErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
