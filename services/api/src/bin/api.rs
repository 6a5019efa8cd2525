//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{PgStore, S3UrlIssuer},
    auth::JwtResolver,
    config::Config,
    error::ApiError,
    web::{
        create_recommendation_handler, delete_recommendation_handler, get_recommendation_handler,
        list_recommendations_handler, prepare_attachment_handler, require_auth, rest::ApiDoc,
        state::AppState, update_recommendation_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use recommendations_core::service::RecommendationService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Upload-URL Issuer ---
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let issuer = Arc::new(S3UrlIssuer::new(
        s3_client,
        config.attachments_bucket.clone(),
        Duration::from_secs(config.signed_url_expiration_secs),
    ));

    // --- 4. Build the Shared AppState ---
    let service = RecommendationService::new(store, issuer);
    let resolver = JwtResolver::new(&config.jwt_secret);
    let app_state = Arc::new(AppState {
        service,
        resolver,
        config: config.clone(),
    });

    // Browser clients can be served from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Every route requires a resolved identity.
    let protected_routes = Router::new()
        .route(
            "/recommendations",
            get(list_recommendations_handler).post(create_recommendation_handler),
        )
        .route(
            "/recommendations/{recommendation_id}",
            get(get_recommendation_handler)
                .patch(update_recommendation_handler)
                .delete(delete_recommendation_handler),
        )
        .route(
            "/recommendations/{recommendation_id}/attachment",
            post(prepare_attachment_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
