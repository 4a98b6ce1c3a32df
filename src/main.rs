use anyhow::Context;

use league_api::config::{log_level_from_env, AppConfig};
use league_api::database::connection::connect_repositories;
use league_api::routes::build_router;
use league_api::services::bootstrap::{ensure_single_admin, seed_demo_data};
use league_api::services::media_service::MediaStore;
use league_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(log_level_from_env())
        .init();

    let config = AppConfig::from_env();
    let addr = config.socket_addr()?;

    let media = MediaStore::new(config.uploads_dir.clone(), config.max_upload_bytes)
        .await
        .with_context(|| format!("Failed to create {}", config.uploads_dir.display()))?;

    let repos = connect_repositories(&config).await?;

    ensure_single_admin(
        repos.users.as_ref(),
        &config.admin_username,
        &config.admin_password,
        config.bcrypt_cost,
    )
    .await
    .context("Failed to reconcile the admin account")?;

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&repos).await {
            tracing::error!("❌ Demo data seeding failed: {}", e);
        }
    }

    let app = build_router(AppState::new(repos, media, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("🚀 Server starting on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
