use crate::app::AppState;
use crate::config::AppConfig;

pub async fn handle(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;
    match state.services.users.seed_superadmin(&config.seed).await? {
        Some(user) => println!("Seeded superadmin {} <{}> ({})", user.username, user.email, user.id),
        None => println!("Superadmin already present, nothing to do"),
    }
    Ok(())
}
