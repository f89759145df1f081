mod admin;
mod app;
mod auth;
mod config;
mod error;
mod gamification;
mod notifications;
mod reviews;
mod sessions;
mod skills;
mod state;
mod swaps;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "skillswap=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    // Periodic sweep marking lapsed PENDING swap requests EXPIRED.
    let sweep_state = app_state.clone();
    tokio::spawn(async move {
        let period =
            std::time::Duration::from_secs(sweep_state.config.swap.sweep_interval_secs);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = swaps::services::expire_lapsed(&sweep_state).await {
                tracing::warn!(error = %e, "expiry sweep failed");
            }
        }
    });

    let app = app::build_app(app_state);
    app::serve(app).await
}
