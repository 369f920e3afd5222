//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JwtIdentityAdapter, PgDocumentStore},
    config::{Config, ConfigError},
    error::ApiError,
    web::{
        home_feed_handler, interview_detail_handler, interviews::ApiDoc, latest_interviews_handler,
        me_handler, my_interviews_handler, require_auth, sign_in_handler, sign_out_handler,
        sign_up_handler, state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use intervu_core::{
    auth::AuthService,
    interviews::InterviewQueries,
    ports::{DocumentStore, IdentityProvider},
    session::SessionManager,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
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
    let docstore = Arc::new(PgDocumentStore::new(db_pool.clone()));
    info!("Running database migrations...");
    docstore.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Wire the Core Services onto the Adapters ---
    let identity: Arc<dyn IdentityProvider> =
        Arc::new(JwtIdentityAdapter::new(db_pool, &config.session_secret));
    let store: Arc<dyn DocumentStore> = docstore;

    let sessions = SessionManager::new(identity.clone(), config.production);
    let auth = AuthService::new(identity, store.clone(), sessions);
    let interviews = InterviewQueries::new(store);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        auth,
        interviews,
        config: config.clone(),
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/sign-up", post(sign_up_handler))
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/auth/sign-out", post(sign_out_handler))
        .route("/auth/me", get(me_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/home", get(home_feed_handler))
        .route("/interviews/mine", get(my_interviews_handler))
        .route("/interviews/latest", get(latest_interviews_handler))
        .route("/interviews/{id}", get(interview_detail_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
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
