mod models;
mod register;

pub use models::{ProductRecord, COLUMNS, DATE_FORMAT, MAX_EAN_DIGITS, MAX_QUANTITY};
pub use register::{ExpiryRegister, SubmissionOutcome};

use crate::components::google_calendar::scheduler_from_config;
use crate::components::sheet::JsonSheetStore;
use crate::config::Config;
use crate::error::AppResult;
use crate::utils::time::parse_timezone;

/// Build the register backed by the configured worksheet file and Google Calendar
pub fn register_from_config(config: &Config) -> AppResult<ExpiryRegister> {
    let timezone = parse_timezone(&config.timezone)?;

    Ok(ExpiryRegister::new(
        JsonSheetStore::new(config.sheet_path.clone()),
        config.worksheet.clone(),
        scheduler_from_config(config),
        config.reminder.clone(),
        timezone,
    ))
}
