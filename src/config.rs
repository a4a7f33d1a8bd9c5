use crate::error::{config_error, env_error, AppResult};
use crate::utils::time::{parse_time, parse_timezone};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default reminder location, shown in the calendar entry
pub const DEFAULT_LOCATION: &str = "Local de Armazenamento";

/// Default file holding reminder settings
pub const DEFAULT_REMINDER_CONFIG: &str = "config/reminder.toml";

/// How the calendar reminder for a record looks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Free text location of the calendar entry
    pub location: String,
    /// Reminder start on the expiry date, HH:MM
    pub start_time: String,
    /// Reminder end on the expiry date, HH:MM
    pub end_time: String,
    /// People invited to every reminder
    pub attendees: Vec<String>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            attendees: Vec::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the OAuth credential is persisted
    pub token_path: PathBuf,
    /// OAuth client configuration downloaded from the Google console
    pub client_secrets_path: PathBuf,
    /// Spreadsheet file backing the expiry register
    pub sheet_path: PathBuf,
    /// Worksheet holding product records
    pub worksheet: String,
    /// Calendar receiving the reminders
    pub calendar_id: String,
    /// Timezone reminders are expressed in
    pub timezone: String,
    /// Locale for user-facing messages
    pub locale: String,
    /// Loopback port for the authorization redirect, 0 picks a free port
    pub redirect_port: u16,
    /// Reminder layout
    pub reminder: ReminderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            client_secrets_path: PathBuf::from("credentials.json"),
            sheet_path: PathBuf::from("data/planilha.json"),
            worksheet: "produtos".to_string(),
            calendar_id: "primary".to_string(),
            timezone: "UTC".to_string(),
            locale: "pt-BR".to_string(),
            redirect_port: 0,
            reminder: ReminderSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let token_path = env_path("VALIDADES_TOKEN_PATH", defaults.token_path);
        let client_secrets_path =
            env_path("VALIDADES_CLIENT_SECRETS_PATH", defaults.client_secrets_path);
        let sheet_path = env_path("VALIDADES_SHEET_PATH", defaults.sheet_path);

        let worksheet = env::var("VALIDADES_WORKSHEET").unwrap_or(defaults.worksheet);
        let calendar_id = env::var("VALIDADES_CALENDAR_ID").unwrap_or(defaults.calendar_id);
        let timezone = env::var("VALIDADES_TIMEZONE").unwrap_or(defaults.timezone);
        let locale = env::var("VALIDADES_LOCALE").unwrap_or(defaults.locale);

        let redirect_port = match env::var("VALIDADES_REDIRECT_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| env_error("VALIDADES_REDIRECT_PORT"))?,
            Err(_) => defaults.redirect_port,
        };

        let reminder_path = env::var("VALIDADES_REMINDER_CONFIG")
            .unwrap_or_else(|_| DEFAULT_REMINDER_CONFIG.to_string());
        let mut reminder = Self::load_reminder_settings(Path::new(&reminder_path))?;

        if let Ok(list) = env::var("VALIDADES_ATTENDEES") {
            reminder.attendees = parse_attendees(&list);
        }

        let config = Config {
            token_path,
            client_secrets_path,
            sheet_path,
            worksheet,
            calendar_id,
            timezone,
            locale,
            redirect_port,
            reminder,
        };
        config.validate()?;

        Ok(config)
    }

    /// Read reminder settings, falling back to defaults when the file is missing
    pub fn load_reminder_settings(path: &Path) -> AppResult<ReminderSettings> {
        if !path.exists() {
            debug!("No reminder settings at {}, using defaults", path.display());
            return Ok(ReminderSettings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = toml::from_str::<ReminderSettings>(&content)?;
        Ok(settings)
    }

    /// Check values that are parsed later on
    pub fn validate(&self) -> AppResult<()> {
        parse_timezone(&self.timezone)?;

        let start = parse_time(&self.reminder.start_time).ok_or_else(|| {
            config_error(&format!("Invalid reminder time: {}", self.reminder.start_time))
        })?;
        let end = parse_time(&self.reminder.end_time).ok_or_else(|| {
            config_error(&format!("Invalid reminder time: {}", self.reminder.end_time))
        })?;

        if start > end {
            return Err(config_error("Reminder start_time must not be after end_time"));
        }

        if self.worksheet.trim().is_empty() {
            return Err(config_error("Worksheet name must not be empty"));
        }

        Ok(())
    }
}

fn env_path(var: &str, default: PathBuf) -> PathBuf {
    env::var(var).map(PathBuf::from).unwrap_or(default)
}

/// Split a comma separated attendee list
pub fn parse_attendees(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}
