use tracing::warn;

/// Locales shipped in `locales/`
pub const AVAILABLE_LOCALES: &[&str] = &["en", "pt-BR"];

/// Switch the locale used for user-facing messages
pub fn set_locale(locale: &str) {
    if AVAILABLE_LOCALES.contains(&locale) {
        rust_i18n::set_locale(locale);
    } else {
        warn!("Unsupported locale '{}', falling back to en", locale);
        rust_i18n::set_locale("en");
    }
}
