mod api;
pub mod models;
pub mod oauth;
mod scheduler;
pub mod store;
pub mod token;

pub use api::{CalendarService, GoogleCalendarClient, GOOGLE_CALENDAR_API};
pub use models::{EventPayload, EventRequest, EventResult, FailureKind, InsertedEvent};
pub use oauth::{AuthorizationFlow, ClientSecrets, InstalledAppFlow};
pub use scheduler::{EventScheduler, FailureReporter, LogReporter, PRIMARY_CALENDAR};
pub use store::CredentialStore;
pub use token::{Credential, CredentialManager, CredentialState, CALENDAR_SCOPE};

use crate::config::Config;

/// Wire the scheduler against Google with the configured files
pub fn scheduler_from_config(config: &Config) -> EventScheduler {
    let flow = InstalledAppFlow::new(
        config.client_secrets_path.clone(),
        vec![CALENDAR_SCOPE.to_string()],
        config.redirect_port,
    );
    let credentials = CredentialManager::new(
        CredentialStore::new(config.token_path.clone()),
        config.client_secrets_path.clone(),
        flow,
    );

    EventScheduler::new(credentials, GoogleCalendarClient::new())
        .with_calendar_id(config.calendar_id.clone())
}
