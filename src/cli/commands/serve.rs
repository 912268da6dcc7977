use crate::app::{self, AppState};
use crate::config::AppConfig;

pub async fn handle(config: &AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting School API in {:?} mode ({:?} store)", config.environment, config.database.backend);

    let state = AppState::from_config(config).await?;
    state.seed(config).await?;

    app::serve(state, config).await
}
