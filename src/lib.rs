#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod completeness;
pub mod db;
pub mod env;
pub mod error;
pub mod models;
pub mod poll;
pub mod stats_providers;
pub mod telemetry;
pub mod validation;
#[cfg(test)]
mod test;

use std::sync::Mutex;

use once_cell::sync::Lazy;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket, tokio};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use api::admin::{
    api_create_school, api_list_coaches, api_list_reports, api_resolve_report,
    api_set_coach_verification, api_set_post_visibility, api_set_thread_visibility,
};
use api::auth::{api_me, api_sign_in, api_sign_out, api_sign_up, auth_callback};
use api::discussions::{
    api_create_post, api_create_report, api_create_thread, api_get_thread, api_list_threads,
};
use api::messaging::{
    api_close_conversation, api_list_conversations, api_list_messages, api_send_message,
    api_start_conversation, api_stream_messages,
};
use api::notifications::{
    api_list_notifications, api_mark_all_read, api_mark_notification_read, api_unread_count,
};
use api::profiles::{
    api_add_highlight, api_add_stat, api_athlete_detail, api_list_highlights, api_list_stats,
    api_my_profile, api_save_athlete_profile, api_save_coach_profile,
};
use api::recruiting::{
    api_interested_athletes, api_list_contact_requests, api_list_sent_contact_requests,
    api_list_shortlist, api_respond_to_contact_request, api_save_athlete, api_search_athletes,
    api_send_contact_request, api_toggle_saved_athlete, api_unsave_athlete,
};
use api::schools::{
    api_add_interest, api_delete_interest, api_get_school, api_list_interests, api_list_schools,
    api_toggle_interest, api_update_interest,
};
use api::stats::{api_import_stats, api_list_providers};
use api::{api_athlete_feed, api_dashboard, health, setup_health, setup_required, setup_status};
use auth::{default_api, forbidden_api, unauthorized_api};
use db::clean_expired_sessions;
use env::AppConfig;
use error::AppError;
use stats_providers::ProviderRegistry;
use telemetry::{OtelGuard, TelemetryFairing, shutdown_telemetry};

const SESSION_SWEEP_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_secs(3600);

pub static TELEMETRY_GUARD: Lazy<Mutex<Option<OtelGuard>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

/// Deletes expired sessions once an hour for as long as the process runs.
pub fn spawn_session_cleanup(pool: SqlitePool) {
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(SESSION_SWEEP_INTERVAL).await;
        }
    });
}

fn telemetry_shutdown() -> AdHoc {
    AdHoc::on_shutdown("Telemetry shutdown", |_| {
        Box::pin(async move { shutdown_telemetry() })
    })
}

pub fn init_rocket(pool: SqlitePool, config: AppConfig) -> Result<Rocket<Build>, Error> {
    info!("Starting recruiting hub");

    let registry = ProviderRegistry::with_builtin()
        .map_err(|e| Error::App(AppError::Internal(e.to_string())))?;

    Ok(rocket::build()
        .manage(pool)
        .manage(config)
        .manage(registry)
        .mount(
            "/api",
            routes![
                health,
                setup_status,
                api_dashboard,
                api_athlete_feed,
                api_sign_up,
                api_sign_in,
                api_sign_out,
                api_me,
                api_my_profile,
                api_save_athlete_profile,
                api_save_coach_profile,
                api_athlete_detail,
                api_list_highlights,
                api_add_highlight,
                api_list_stats,
                api_add_stat,
                api_list_schools,
                api_get_school,
                api_list_interests,
                api_add_interest,
                api_toggle_interest,
                api_update_interest,
                api_delete_interest,
                api_search_athletes,
                api_interested_athletes,
                api_list_shortlist,
                api_save_athlete,
                api_unsave_athlete,
                api_toggle_saved_athlete,
                api_send_contact_request,
                api_list_contact_requests,
                api_list_sent_contact_requests,
                api_respond_to_contact_request,
                api_list_conversations,
                api_start_conversation,
                api_list_messages,
                api_send_message,
                api_close_conversation,
                api_stream_messages,
                api_list_notifications,
                api_unread_count,
                api_mark_notification_read,
                api_mark_all_read,
                api_list_threads,
                api_create_thread,
                api_get_thread,
                api_create_post,
                api_create_report,
                api_list_providers,
                api_import_stats,
                api_list_coaches,
                api_set_coach_verification,
                api_create_school,
                api_list_reports,
                api_resolve_report,
                api_set_thread_visibility,
                api_set_post_visibility,
            ],
        )
        .mount("/", routes![auth_callback])
        .register("/api", catchers![unauthorized_api, forbidden_api, default_api])
        .attach(TelemetryFairing)
        .attach(telemetry_shutdown()))
}

/// The server without a database: health and setup status answer, every other
/// `/api` path reports that setup is required.
pub fn init_setup_rocket(config: AppConfig) -> Rocket<Build> {
    info!("Starting recruiting hub in setup-required mode");

    rocket::build()
        .manage(config)
        .mount("/api", routes![setup_health, setup_status])
        .register("/api", catchers![setup_required])
        .attach(TelemetryFairing)
        .attach(telemetry_shutdown())
}
