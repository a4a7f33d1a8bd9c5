use validades::components::expiry_register::SubmissionOutcome;
use validades::config::{Config, ReminderSettings};
use validades::utils::i18n::set_locale;

/// Smoke test to verify that the default config is usable
#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.validate().is_ok());
    assert_eq!(config.worksheet, "produtos");
    assert_eq!(config.calendar_id, "primary");
    assert_eq!(config.redirect_port, 0);
}

/// Reminder settings can be loaded from a partial file
#[test]
fn test_reminder_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reminder.toml");
    std::fs::write(
        &path,
        "start_time = \"08:30\"\nattendees = [\"estoque@example.com\"]\n",
    )
    .unwrap();

    let settings = Config::load_reminder_settings(&path).unwrap();
    assert_eq!(settings.start_time, "08:30");
    assert_eq!(settings.end_time, "17:00");
    assert_eq!(settings.attendees, vec!["estoque@example.com".to_string()]);

    let missing = Config::load_reminder_settings(&dir.path().join("none.toml")).unwrap();
    assert_eq!(missing, ReminderSettings::default());
}

/// Outcome messages carry the link or the reason in every locale
#[test]
fn test_outcome_messages() {
    for locale in ["pt-BR", "en"] {
        set_locale(locale);

        let scheduled = SubmissionOutcome::Scheduled {
            link: "https://calendar.example/event/1".to_string(),
        };
        assert!(scheduled.message().contains("https://calendar.example/event/1"));

        let saved = SubmissionOutcome::SavedWithoutReminder {
            reason: "quota exceeded".to_string(),
        };
        assert!(saved.message().contains("quota exceeded"));
    }
}
