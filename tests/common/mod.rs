#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use validades::components::google_calendar::{
    AuthorizationFlow, CalendarService, Credential, EventPayload, FailureReporter, InsertedEvent,
    CALENDAR_SCOPE,
};
use validades::error::{auth_error, google_calendar_error, AppResult};

/// Write a `credentials.json` whose token endpoint is `token_uri`
pub fn write_client_secrets(dir: &Path, token_uri: &str) -> PathBuf {
    let path = dir.join("credentials.json");
    let json = serde_json::json!({
        "installed": {
            "client_id": "test-client.apps.googleusercontent.com",
            "client_secret": "test-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost"]
        }
    });
    std::fs::write(&path, json.to_string()).unwrap();
    path
}

pub fn valid_credential(access_token: &str) -> Credential {
    Credential {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Some(Utc::now() + Duration::hours(1)),
        scopes: vec![CALENDAR_SCOPE.to_string()],
    }
}

pub fn expired_credential() -> Credential {
    Credential {
        access_token: Some("ya29.expired".to_string()),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Some(Utc::now() - Duration::hours(1)),
        scopes: vec![CALENDAR_SCOPE.to_string()],
    }
}

/// Authorization flow that either grants a fixed credential or is cancelled
#[derive(Clone)]
pub struct MockFlow {
    grant: Option<Credential>,
    pub runs: Arc<AtomicUsize>,
}

impl MockFlow {
    pub fn granting(credential: Credential) -> Self {
        Self {
            grant: Some(credential),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            grant: None,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationFlow for MockFlow {
    async fn run(&self) -> AppResult<Credential> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.grant
            .clone()
            .ok_or_else(|| auth_error("Authorization was not granted: access_denied"))
    }
}

/// Calendar service answering every insert the same way
#[derive(Clone)]
pub struct MockCalendar {
    answer: Result<InsertedEvent, String>,
    pub inserted: Arc<Mutex<Vec<EventPayload>>>,
}

impl MockCalendar {
    pub fn returning_link(link: &str) -> Self {
        Self {
            answer: Ok(InsertedEvent {
                id: "evt123".to_string(),
                html_link: Some(link.to_string()),
                status: Some("confirmed".to_string()),
            }),
            inserted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            inserted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    async fn insert_event(
        &self,
        _calendar_id: &str,
        _access_token: &str,
        payload: &EventPayload,
    ) -> AppResult<InsertedEvent> {
        self.inserted.lock().unwrap().push(payload.clone());
        self.answer
            .clone()
            .map_err(|message| google_calendar_error(&message))
    }
}

/// Collects reported failure messages
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
