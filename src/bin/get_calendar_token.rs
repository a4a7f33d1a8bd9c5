use validades::components::google_calendar::{
    AuthorizationFlow, CredentialStore, InstalledAppFlow, CALENDAR_SCOPE,
};
use validades::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;

    // Always ask for consent, replacing whatever is stored
    let flow = InstalledAppFlow::new(
        config.client_secrets_path.clone(),
        vec![CALENDAR_SCOPE.to_string()],
        config.redirect_port,
    );
    let credential = flow.run().await?;

    let store = CredentialStore::new(config.token_path.clone());
    store.save(&credential)?;

    println!(
        "Authorization complete, credential saved to {}",
        store.path().display()
    );

    Ok(())
}
