use super::oauth::{refresh_access_token, AuthorizationFlow, ClientSecrets};
use super::store::CredentialStore;
use crate::error::{auth_error, AppResult, Error};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Scope needed to create events
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Tokens are treated as expired slightly early
const EXPIRY_SKEW_SECS: i64 = 60;

/// Authorization grant for the calendar service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token", alias = "access_token", default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Where a credential stands at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Valid,
    Refreshable,
    Absent,
}

impl Credential {
    pub fn state_at(&self, now: DateTime<Utc>) -> CredentialState {
        let has_access = self
            .access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty());
        let unexpired = match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => true,
        };

        if has_access && unexpired {
            CredentialState::Valid
        } else if self.refresh_token.as_deref().is_some_and(|t| !t.is_empty()) {
            CredentialState::Refreshable
        } else {
            CredentialState::Absent
        }
    }

    pub fn state(&self) -> CredentialState {
        self.state_at(Utc::now())
    }

    /// An empty scope list means the grant did not record its scopes
    pub fn covers_scopes(&self, required: &[String]) -> bool {
        self.scopes.is_empty() || required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Access token for a bearer header
    pub fn bearer(&self) -> AppResult<&str> {
        self.access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| auth_error("Credential has no access token"))
    }
}

/// Produces a usable credential for every scheduling call
pub struct CredentialManager {
    store: CredentialStore,
    secrets_path: PathBuf,
    scopes: Vec<String>,
    flow: Box<dyn AuthorizationFlow>,
    client: Client,
    cached: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(
        store: CredentialStore,
        secrets_path: impl Into<PathBuf>,
        flow: impl AuthorizationFlow + 'static,
    ) -> Self {
        Self {
            store,
            secrets_path: secrets_path.into(),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            flow: Box::new(flow),
            client: Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Return a valid credential: cached, refreshed, or freshly authorized
    pub async fn obtain_credential(&self) -> AppResult<Credential> {
        let mut cached = self.cached.lock().await;

        let current = match cached.take() {
            Some(credential) => Some(credential),
            None => self.load_stored(),
        };

        if let Some(credential) = current {
            match credential.state() {
                CredentialState::Valid => {
                    debug!("Using stored credential");
                    *cached = Some(credential.clone());
                    return Ok(credential);
                }
                CredentialState::Refreshable => match self.refresh(&credential).await {
                    Ok(refreshed) => {
                        info!("Access token refreshed");
                        self.persist(&refreshed);
                        *cached = Some(refreshed.clone());
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        warn!("Token refresh failed, authorization required: {}", e);
                    }
                },
                CredentialState::Absent => {
                    debug!("Stored credential is unusable");
                }
            }
        }

        info!("Starting interactive authorization");
        let fresh = self.flow.run().await.map_err(into_auth)?;
        self.persist(&fresh);
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    fn load_stored(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(Some(credential)) if credential.covers_scopes(&self.scopes) => Some(credential),
            Ok(Some(_)) => {
                warn!("Stored credential lacks the calendar scope, authorization required");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable credential store: {}", e);
                None
            }
        }
    }

    async fn refresh(&self, credential: &Credential) -> AppResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| auth_error("No refresh token in credential"))?;

        let secrets = ClientSecrets::load(&self.secrets_path)?;
        let response = refresh_access_token(&self.client, &secrets, refresh_token).await?;

        let scopes = if credential.scopes.is_empty() {
            &self.scopes
        } else {
            &credential.scopes
        };

        // Google usually omits the refresh token on refresh
        Ok(response.into_credential(credential.refresh_token.clone(), scopes, Utc::now()))
    }

    fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential) {
            warn!(
                "Failed to persist credential to {}, next run will ask for authorization again: {}",
                self.store.path().display(),
                e
            );
        }
    }
}

fn into_auth(err: Error) -> Error {
    match err {
        Error::Auth(_) => err,
        other => Error::Auth(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn credential(access: Option<&str>, refresh: Option<&str>, expiry_min: Option<i64>) -> Credential {
        Credential {
            access_token: access.map(str::to_string),
            refresh_token: refresh.map(str::to_string),
            expiry: expiry_min.map(|m| now() + Duration::minutes(m)),
            scopes: vec![],
        }
    }

    #[test]
    fn test_credential_states() {
        assert_eq!(
            credential(Some("a"), Some("r"), Some(30)).state_at(now()),
            CredentialState::Valid
        );
        assert_eq!(
            credential(Some("a"), None, None).state_at(now()),
            CredentialState::Valid
        );
        assert_eq!(
            credential(Some("a"), Some("r"), Some(-5)).state_at(now()),
            CredentialState::Refreshable
        );
        assert_eq!(
            credential(None, Some("r"), None).state_at(now()),
            CredentialState::Refreshable
        );
        assert_eq!(
            credential(Some("a"), None, Some(-5)).state_at(now()),
            CredentialState::Absent
        );
        assert_eq!(
            credential(Some(""), Some(""), None).state_at(now()),
            CredentialState::Absent
        );
    }

    #[test]
    fn test_expiry_skew() {
        // Expiring within the skew window counts as expired
        let almost = Credential {
            expiry: Some(now() + Duration::seconds(30)),
            ..credential(Some("a"), Some("r"), None)
        };
        assert_eq!(almost.state_at(now()), CredentialState::Refreshable);
    }

    #[test]
    fn test_scope_coverage() {
        let required = vec![CALENDAR_SCOPE.to_string()];

        let unknown = credential(Some("a"), None, None);
        assert!(unknown.covers_scopes(&required));

        let readonly = Credential {
            scopes: vec!["https://www.googleapis.com/auth/calendar.readonly".to_string()],
            ..unknown.clone()
        };
        assert!(!readonly.covers_scopes(&required));

        let full = Credential {
            scopes: required.clone(),
            ..unknown
        };
        assert!(full.covers_scopes(&required));
    }

    #[test]
    fn test_bearer_requires_token() {
        assert_eq!(credential(Some("a"), None, None).bearer().unwrap(), "a");
        assert!(credential(None, Some("r"), None).bearer().is_err());
    }
}
