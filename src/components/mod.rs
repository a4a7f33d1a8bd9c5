// Export components
pub mod expiry_register;
pub mod google_calendar;
pub mod sheet;

// Re-export the form handler and the scheduler
pub use expiry_register::{ExpiryRegister, ProductRecord, SubmissionOutcome};
pub use google_calendar::{EventRequest, EventResult, EventScheduler};
