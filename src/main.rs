use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod db;
mod error;
mod middleware;

use auth::TokenService;
use config::Config;
use db::{CardService, LedgerService, LoanService, UserService};

pub struct AppState {
    pub config: Config,
    pub db_pool: sqlx::PgPool,
    pub tokens: TokenService,
    pub users: UserService,
    pub ledger: LedgerService,
    pub loans: LoanService,
    pub cards: CardService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // trying multiple .env locations since working directory differs between dev and prod
    let _ = dotenvy::from_filename_override(".env");
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let _ = dotenvy::dotenv_override();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sacco_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Village SACCO backend");

    let config = Config::from_env().context("error with configuration")?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Database connected and migrated");

    let state = Arc::new(AppState {
        tokens: TokenService::new(&config.jwt_secret),
        users: UserService::new(db_pool.clone()),
        ledger: LedgerService::new(db_pool.clone()),
        loans: LoanService::new(db_pool.clone()),
        cards: CardService::new(db_pool.clone()),
        db_pool,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/logout", post(api::auth::logout))
        .route(
            "/api/savings",
            get(api::savings::list_savings).post(api::savings::create_deposit),
        )
        .route("/api/savings/withdraw", post(api::savings::withdraw))
        .route("/api/transactions", get(api::transactions::list_transactions))
        .route("/api/transfers", post(api::transactions::create_transfer))
        .route(
            "/api/loans",
            get(api::loans::list_loans).post(api::loans::request_loan),
        )
        .route(
            "/api/cards",
            get(api::cards::list_cards).post(api::cards::request_card),
        )
        .route("/api/admin/overview", get(api::admin::overview))
        .route("/api/admin/members", get(api::admin::list_members))
        .route(
            "/api/admin/members/:member_id/activate",
            post(api::admin::activate_member),
        )
        .route("/api/admin/loans", get(api::admin::list_loans))
        .route(
            "/api/admin/loans/:loan_id/approve",
            post(api::admin::approve_loan),
        )
        .route(
            "/api/admin/loans/:loan_id/reject",
            post(api::admin::reject_loan),
        )
        .route(
            "/api/admin/loans/:loan_id/disburse",
            post(api::admin::disburse_loan),
        )
        .route("/api/admin/cards", get(api::admin::list_cards))
        .route(
            "/api/admin/cards/:card_id/activate",
            post(api::admin::activate_card),
        )
        // the gate wraps every route; public paths pass through via its allowlist
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // in case the configured port is taken, try a few more before giving up
    let mut port = config.port;
    let mut listener = None;

    for _ in 0..10u16 {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => {
                listener = Some((addr, l));
                break;
            }
            Err(e) => {
                tracing::warn!("Failed to bind to {}: {} (trying next port)", addr, e);
                port = port.saturating_add(1);
            }
        }
    }

    let (addr, listener) = listener.ok_or_else(|| {
        anyhow::anyhow!(
            "Failed to bind to any port in range {}..{}",
            config.port,
            config.port.saturating_add(9)
        )
    })?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
