use super::models::{normalize_number, ProductRecord, COLUMNS};
use crate::components::google_calendar::{EventRequest, EventResult, EventScheduler};
use crate::components::sheet::{SheetStore, Table};
use crate::config::ReminderSettings;
use crate::error::{validation_error, AppResult};
use crate::utils::time::reminder_window;
use chrono_tz::Tz;
use tracing::{info, warn};

/// What happened to a record that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Saved and reminded
    Scheduled { link: String },
    /// Saved, but the calendar reminder could not be created
    SavedWithoutReminder { reason: String },
}

impl SubmissionOutcome {
    /// Localized message for the person filling the form
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Scheduled { link } => {
                t!("submission_scheduled", link = link).to_string()
            }
            SubmissionOutcome::SavedWithoutReminder { reason } => {
                t!("submission_without_reminder", reason = reason).to_string()
            }
        }
    }
}

/// Form handler: stores product records and schedules their reminders
pub struct ExpiryRegister {
    sheet: Box<dyn SheetStore>,
    worksheet: String,
    scheduler: EventScheduler,
    reminder: ReminderSettings,
    timezone: Tz,
}

impl ExpiryRegister {
    pub fn new(
        sheet: impl SheetStore + 'static,
        worksheet: impl Into<String>,
        scheduler: EventScheduler,
        reminder: ReminderSettings,
        timezone: Tz,
    ) -> Self {
        Self {
            sheet: Box::new(sheet),
            worksheet: worksheet.into(),
            scheduler,
            reminder,
            timezone,
        }
    }

    /// Validate, append to the worksheet, then schedule the reminder.
    ///
    /// The worksheet write is kept even when scheduling fails.
    pub async fn submit(&self, record: &ProductRecord) -> AppResult<SubmissionOutcome> {
        record.validate()?;

        let mut table = self.sheet.read(&self.worksheet, WHOLE_SHEET).await?;
        conform_header(&mut table);

        if is_registered(&table, record.ean_13) {
            return Err(validation_error(&t!("validation_duplicate")));
        }

        table.push_row(record.to_row(&table.columns))?;
        self.sheet.update(&self.worksheet, &table).await?;
        info!("Record for EAN {} saved to {}", record.ean_13, self.worksheet);

        let request = match self.reminder_request(record) {
            Ok(request) => request,
            Err(e) => {
                warn!("Reminder for EAN {} not created: {}", record.ean_13, e);
                return Ok(SubmissionOutcome::SavedWithoutReminder {
                    reason: e.to_string(),
                });
            }
        };

        match self.scheduler.schedule(&request).await {
            EventResult::Scheduled { link } => Ok(SubmissionOutcome::Scheduled { link }),
            EventResult::Failed { kind, reason } => {
                warn!("Reminder for EAN {} not created ({}): {}", record.ean_13, kind, reason);
                Ok(SubmissionOutcome::SavedWithoutReminder { reason })
            }
        }
    }

    /// Records currently in the worksheet, skipping rows that do not parse
    pub async fn list(&self) -> AppResult<Vec<ProductRecord>> {
        let mut table = self.sheet.read(&self.worksheet, WHOLE_SHEET).await?;
        conform_header(&mut table);

        let records = (0..table.len())
            .filter_map(|row| match ProductRecord::from_row(&table, row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping worksheet row: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Calendar entry announcing the expiry of `record`
    pub fn reminder_request(&self, record: &ProductRecord) -> AppResult<EventRequest> {
        let (start, end) = reminder_window(
            record.expiry_date,
            &self.reminder.start_time,
            &self.reminder.end_time,
            self.timezone,
        )?;

        EventRequest::new(
            record.reminder_summary(),
            self.reminder.location.clone(),
            record.reminder_description(),
            start,
            end,
            self.reminder.attendees.clone(),
        )
    }
}

/// Every worksheet column, since `update` rewrites the whole worksheet
const WHOLE_SHEET: usize = usize::MAX;

/// Match headers such as `EAN-13` to their column and add the missing ones
fn conform_header(table: &mut Table) {
    for name in COLUMNS {
        if table.column_index(name).is_some() {
            continue;
        }
        if let Some(index) = table
            .columns
            .iter()
            .position(|column| header_key(column) == header_key(name))
        {
            info!("Reading worksheet column '{}' as '{}'", table.columns[index], name);
            table.columns[index] = name.to_string();
        }
    }

    table.ensure_columns(&COLUMNS);
}

fn header_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_registered(table: &Table, ean_13: u64) -> bool {
    let ean = ean_13.to_string();
    table
        .column_values("ean_13")
        .any(|cell| normalize_number(cell) == ean)
}
