use rocket::launch;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use tracing::{error, info, warn};

use recruiting_hub::env::{AppConfig, load_environment};
use recruiting_hub::telemetry::init_tracing;
use recruiting_hub::{
    Error, TELEMETRY_GUARD, init_rocket, init_setup_rocket, spawn_session_cleanup,
};

async fn connect(database_url: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(recruiting_hub::error::AppError::from)?;
    info!("Migrations completed successfully");

    Ok(pool)
}

async fn build_rocket() -> rocket::Rocket<rocket::Build> {
    if let Err(e) = load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration, using defaults: {:#}", e);
            AppConfig {
                database_url: std::env::var("DATABASE_URL").ok(),
                ..AppConfig::default()
            }
        }
    };

    if let Some(guard) = init_tracing(&config) {
        if let Ok(mut slot) = TELEMETRY_GUARD.lock() {
            *slot = Some(guard);
        }
    }

    let Some(database_url) = config.database_url.clone() else {
        warn!("DATABASE_URL is not set");
        return init_setup_rocket(config);
    };

    let pool = match connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Database unavailable, starting in setup-required mode");
            return init_setup_rocket(config);
        }
    };

    spawn_session_cleanup(pool.clone());

    match init_rocket(pool, config.clone()) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!(error = %e, "Failed to build the application");
            init_setup_rocket(config)
        }
    }
}

#[launch]
async fn rocket() -> _ {
    build_rocket().await
}
