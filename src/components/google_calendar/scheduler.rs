use super::api::CalendarService;
use super::models::{EventRequest, EventResult, FailureKind};
use super::token::CredentialManager;
use crate::error::Error;
use tracing::{error, info};

/// Calendar used when none is configured
pub const PRIMARY_CALENDAR: &str = "primary";

/// Where scheduling failures are surfaced to the user
pub trait FailureReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Reports failures through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, message: &str) {
        error!("An error occurred: {}", message);
    }
}

/// Turns event requests into calendar entries
pub struct EventScheduler {
    credentials: CredentialManager,
    service: Box<dyn CalendarService>,
    calendar_id: String,
    reporter: Box<dyn FailureReporter>,
}

impl EventScheduler {
    pub fn new(credentials: CredentialManager, service: impl CalendarService + 'static) -> Self {
        Self {
            credentials,
            service: Box::new(service),
            calendar_id: PRIMARY_CALENDAR.to_string(),
            reporter: Box::new(LogReporter),
        }
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn with_reporter(mut self, reporter: impl FailureReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Create the event; every failure comes back as `EventResult::Failed`
    pub async fn schedule(&self, request: &EventRequest) -> EventResult {
        let credential = match self.credentials.obtain_credential().await {
            Ok(credential) => credential,
            Err(e) => return self.fail(FailureKind::Auth, reason_of(e)),
        };

        let access_token = match credential.bearer() {
            Ok(token) => token,
            Err(e) => return self.fail(FailureKind::Auth, reason_of(e)),
        };

        let payload = request.to_payload();
        match self
            .service
            .insert_event(&self.calendar_id, access_token, &payload)
            .await
        {
            Ok(event) => match event.html_link.filter(|link| !link.is_empty()) {
                Some(link) => {
                    info!("Event {} created: {}", event.id, link);
                    EventResult::Scheduled { link }
                }
                None => self.fail(
                    FailureKind::Service,
                    "Calendar response did not include an event link".to_string(),
                ),
            },
            Err(e) => self.fail(FailureKind::Service, reason_of(e)),
        }
    }

    fn fail(&self, kind: FailureKind, reason: String) -> EventResult {
        let result = EventResult::failed(kind, reason);
        if let EventResult::Failed { reason, .. } = &result {
            self.reporter.report(reason);
        }
        result
    }
}

/// Message without the error-kind prefix
fn reason_of(err: Error) -> String {
    match err {
        Error::Auth(message) | Error::GoogleCalendar(message) => message,
        other => other.to_string(),
    }
}
