//! OAuth plumbing: client secrets, token endpoint calls, and the loopback
//! consent flow used on first run.

use super::token::Credential;
use crate::error::{auth_error, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Interface the redirect listener binds to
const LOOPBACK_HOST: &str = "127.0.0.1";

/// OAuth client identity from the Google console
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load a downloaded `credentials.json`
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(auth_error(&format!(
                "OAuth client file not found at {}. Download it from \
                 https://console.cloud.google.com/apis/credentials",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> AppResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(contents)
            .map_err(|e| auth_error(&format!("Invalid OAuth client file: {}", e)))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| auth_error("OAuth client file has neither 'installed' nor 'web' section"))
    }
}

/// Successful answer from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Turn the response into a credential, keeping `previous_refresh` when
    /// the server did not issue a new refresh token
    pub fn into_credential(
        self,
        previous_refresh: Option<String>,
        requested_scopes: &[String],
        now: DateTime<Utc>,
    ) -> Credential {
        let scopes = match &self.scope {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(str::to_string).collect()
            }
            _ => requested_scopes.to_vec(),
        };

        Credential {
            access_token: Some(self.access_token),
            refresh_token: self
                .refresh_token
                .filter(|token| !token.is_empty())
                .or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scopes,
        }
    }
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Trade a refresh token for a new access token
pub async fn refresh_access_token(
    client: &Client,
    secrets: &ClientSecrets,
    refresh_token: &str,
) -> AppResult<TokenResponse> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    post_token_request(client, &secrets.token_uri, &params).await
}

/// Trade an authorization code for tokens
pub async fn exchange_code(
    client: &Client,
    secrets: &ClientSecrets,
    code: &str,
    redirect_uri: &str,
) -> AppResult<TokenResponse> {
    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];

    post_token_request(client, &secrets.token_uri, &params).await
}

async fn post_token_request(
    client: &Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> AppResult<TokenResponse> {
    let response = client
        .post(token_uri)
        .form(params)
        .send()
        .await
        .map_err(|e| auth_error(&format!("Token request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());

        let detail = match serde_json::from_str::<OAuthErrorBody>(&body) {
            Ok(err) => match err.error_description {
                Some(description) => format!("{}: {}", err.error, description),
                None => err.error,
            },
            Err(_) => body,
        };

        return Err(auth_error(&format!(
            "Token endpoint returned HTTP {} - {}",
            status, detail
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))
}

/// Consent page URL for the installed-app flow
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> AppResult<Url> {
    let mut url = Url::parse(&secrets.auth_uri)
        .map_err(|e| auth_error(&format!("Invalid auth_uri: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &scopes.join(" "))
        .append_pair("state", state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");

    Ok(url)
}

fn callback_query(request_url: &str) -> AppResult<Vec<(String, String)>> {
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(request_url))
        .map_err(|e| auth_error(&format!("Malformed redirect: {}", e)))?;

    Ok(url.query_pairs().into_owned().collect())
}

/// Whether a loopback request carries the authorization redirect
pub fn is_callback(request_url: &str) -> bool {
    callback_query(request_url)
        .map(|pairs| pairs.iter().any(|(k, _)| k == "code" || k == "error"))
        .unwrap_or(false)
}

/// Extract the authorization code from the redirect, checking `state`
pub fn parse_callback(request_url: &str, expected_state: &str) -> AppResult<String> {
    let pairs = callback_query(request_url)?;
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    if let Some(error) = param("error") {
        return Err(auth_error(&format!("Authorization was not granted: {}", error)));
    }

    if param("state").as_deref() != Some(expected_state) {
        return Err(auth_error("Authorization state mismatch"));
    }

    param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| auth_error("No authorization code found in callback"))
}

/// Interactive user consent producing a fresh credential
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    async fn run(&self) -> AppResult<Credential>;
}

/// Browser consent with a loopback redirect listener
pub struct InstalledAppFlow {
    secrets_path: PathBuf,
    scopes: Vec<String>,
    port: u16,
    client: Client,
}

impl InstalledAppFlow {
    pub fn new(secrets_path: impl Into<PathBuf>, scopes: Vec<String>, port: u16) -> Self {
        Self {
            secrets_path: secrets_path.into(),
            scopes,
            port,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl AuthorizationFlow for InstalledAppFlow {
    async fn run(&self) -> AppResult<Credential> {
        let secrets = ClientSecrets::load(&self.secrets_path)?;

        let server = tiny_http::Server::http((LOOPBACK_HOST, self.port))
            .map_err(|e| auth_error(&format!("Failed to start redirect listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| auth_error("Redirect listener has no TCP address"))?;

        let redirect_uri = loopback_redirect_uri(port);
        let state = uuid::Uuid::new_v4().to_string();
        let url = authorization_url(&secrets, &redirect_uri, &self.scopes, &state)?;

        info!("Opening browser for Google Calendar authorization: {}", url);
        if let Err(e) = webbrowser::open(url.as_str()) {
            warn!("Could not open a browser ({}), visit the URL above manually", e);
        }

        info!("Waiting for authorization callback on port {}", port);
        let code = tokio::task::spawn_blocking(move || wait_for_callback(&server, &state))
            .await
            .map_err(|e| auth_error(&format!("Redirect listener stopped: {}", e)))??;

        let response = exchange_code(&self.client, &secrets, &code, &redirect_uri).await?;
        Ok(response.into_credential(None, &self.scopes, Utc::now()))
    }
}

/// Redirect target on the address the listener is bound to
fn loopback_redirect_uri(port: u16) -> String {
    format!("http://{}:{}/", LOOPBACK_HOST, port)
}

fn wait_for_callback(server: &tiny_http::Server, state: &str) -> AppResult<String> {
    loop {
        let request = server
            .recv()
            .map_err(|e| auth_error(&format!("Failed to receive callback: {}", e)))?;
        let url = request.url().to_string();

        if !is_callback(&url) {
            debug!("Ignoring request to {}", url);
            if let Err(e) = request.respond(tiny_http::Response::empty(tiny_http::StatusCode(404))) {
                warn!("Could not answer {}: {}", url, e);
            }
            continue;
        }

        let outcome = parse_callback(&url, state);
        let message = match &outcome {
            Ok(_) => "Authorization successful! You can close this window.".to_string(),
            Err(e) => format!("Authorization failed: {}", e),
        };

        if let Err(e) = request.respond(tiny_http::Response::from_string(message)) {
            warn!("Could not answer the browser: {}", e);
        }

        return outcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn secrets() -> ClientSecrets {
        ClientSecrets {
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    #[test]
    fn test_client_secrets_sections() {
        let installed = ClientSecrets::from_json(
            r#"{"installed": {"client_id": "id.apps.googleusercontent.com", "client_secret": "secret",
                "redirect_uris": ["http://localhost"]}}"#,
        )
        .unwrap();
        assert_eq!(installed, secrets());

        let web = ClientSecrets::from_json(
            r#"{"web": {"client_id": "w", "client_secret": "s", "token_uri": "http://127.0.0.1/token"}}"#,
        )
        .unwrap();
        assert_eq!(web.token_uri, "http://127.0.0.1/token");

        assert!(ClientSecrets::from_json(r#"{"other": {}}"#).is_err());
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url(
            &secrets(),
            "http://localhost:8085/",
            &["https://www.googleapis.com/auth/calendar".to_string()],
            "abc",
        )
        .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("redirect_uri".to_string(), "http://localhost:8085/".to_string())));
        assert!(pairs.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(pairs.contains(&("state".to_string(), "abc".to_string())));
        assert!(pairs.contains(&(
            "scope".to_string(),
            "https://www.googleapis.com/auth/calendar".to_string()
        )));
    }

    #[test]
    fn test_parse_callback() {
        assert_eq!(
            parse_callback("/?state=abc&code=4%2F0Ab", "abc").unwrap(),
            "4/0Ab"
        );
        assert!(parse_callback("/?state=other&code=x", "abc").is_err());
        assert!(parse_callback("/?error=access_denied&state=abc", "abc").is_err());
        assert!(parse_callback("/?state=abc", "abc").is_err());
    }

    #[test]
    fn test_redirect_uri_matches_listener_address() {
        assert_eq!(loopback_redirect_uri(8085), "http://127.0.0.1:8085/");
    }

    #[tokio::test]
    async fn test_wait_for_callback_skips_other_requests() {
        let server = tiny_http::Server::http((LOOPBACK_HOST, 0)).unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let waiter = tokio::task::spawn_blocking(move || wait_for_callback(&server, "abc"));

        let client = Client::new();
        let base = loopback_redirect_uri(port);
        let favicon = client
            .get(format!("{}favicon.ico", base))
            .send()
            .await
            .unwrap();
        assert_eq!(favicon.status().as_u16(), 404);

        let callback = client
            .get(format!("{}?state=abc&code=4%2F0Ab", base))
            .send()
            .await
            .unwrap();
        assert!(callback.status().is_success());
        assert_eq!(waiter.await.unwrap().unwrap(), "4/0Ab");
    }

    #[test]
    fn test_is_callback() {
        assert!(is_callback("/?code=x&state=y"));
        assert!(is_callback("/?error=access_denied"));
        assert!(!is_callback("/favicon.ico"));
    }

    #[test]
    fn test_token_response_keeps_previous_refresh() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let response = TokenResponse {
            access_token: "new".to_string(),
            expires_in: Some(3599),
            refresh_token: None,
            scope: Some("https://www.googleapis.com/auth/calendar".to_string()),
        };

        let credential = response.into_credential(Some("old-refresh".to_string()), &[], now);
        assert_eq!(credential.access_token.as_deref(), Some("new"));
        assert_eq!(credential.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(credential.expiry, Some(now + Duration::seconds(3599)));
        assert_eq!(credential.scopes.len(), 1);
    }
}
