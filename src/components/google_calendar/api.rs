use super::models::{EventPayload, GoogleErrorBody, InsertedEvent};
use crate::error::{google_calendar_error, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Base URL of the Google Calendar v3 API
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// The single calendar operation the scheduler needs
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Insert an event into `calendar_id`
    async fn insert_event(
        &self,
        calendar_id: &str,
        access_token: &str,
        payload: &EventPayload,
    ) -> AppResult<InsertedEvent>;
}

/// REST client for Google Calendar
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: String,
}

impl Default for GoogleCalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleCalendarClient {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_CALENDAR_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        // Calendar ids contain '@' and '#', let the url crate escape them
        url.path_segments_mut()
            .map_err(|_| google_calendar_error("Calendar API URL cannot have a path"))?
            .pop_if_empty()
            .extend(&["calendars", calendar_id, "events"]);

        Ok(url)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn insert_event(
        &self,
        calendar_id: &str,
        access_token: &str,
        payload: &EventPayload,
    ) -> AppResult<InsertedEvent> {
        let url = self.events_url(calendar_id)?;
        debug!("Inserting event '{}' into {}", payload.summary, calendar_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to insert event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());

            // Prefer the API's own message, it is what users can act on
            let message = match serde_json::from_str::<GoogleErrorBody>(&error_body) {
                Ok(body) if !body.error.message.is_empty() => body.error.message,
                _ => format!("HTTP {} - {}", status, error_body),
            };
            return Err(google_calendar_error(&message));
        }

        response
            .json::<InsertedEvent>()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse event response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_escapes_calendar_id() {
        let client = GoogleCalendarClient::new();
        assert_eq!(
            client.events_url("primary").unwrap().as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
        assert_eq!(
            client
                .events_url("en.brazilian#holiday@group.v.calendar.google.com")
                .unwrap()
                .as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/en.brazilian%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn test_events_url_on_bare_host() {
        let client = GoogleCalendarClient::with_base_url("http://127.0.0.1:9999");
        assert_eq!(
            client.events_url("primary").unwrap().as_str(),
            "http://127.0.0.1:9999/calendars/primary/events"
        );
    }
}
