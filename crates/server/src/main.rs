//! afrikmarket-rs server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum_extra::extract::cookie::Key;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use afrikmarket_api::{
    middleware::{method_override_middleware, session_middleware, AppState},
    router as api_router,
};
use afrikmarket_common::{
    AppError, Config, ImageHostStorage, LocalStorage, StorageBackend,
    storage::MAX_IMAGE_BYTES,
};
use afrikmarket_core::{
    AdService, BlogService, ModerationService, NotificationService, SessionService,
    SitemapService, StatsService, TestimonialService, UserService,
};
use afrikmarket_db::repositories::{
    AdRepository, BlogPostRepository, NotificationRepository, SessionRepository,
    TestimonialRepository, UserRepository,
};
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the configured storage backend.
fn build_storage(config: &Config) -> Result<Arc<dyn StorageBackend>, AppError> {
    if config.storage.backend == "remote" {
        let upload_url = config
            .storage
            .upload_url
            .clone()
            .ok_or_else(|| AppError::Config("storage.upload_url is required".to_string()))?;
        let api_key = config
            .storage
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("storage.api_key is required".to_string()))?;
        let api_secret = config
            .storage
            .api_secret
            .clone()
            .ok_or_else(|| AppError::Config("storage.api_secret is required".to_string()))?;

        Ok(Arc::new(ImageHostStorage::new(
            upload_url,
            api_key,
            api_secret,
            config.storage.folder.clone(),
        )))
    } else {
        Ok(Arc::new(LocalStorage::new(
            PathBuf::from(&config.storage.local_path),
            config.storage.local_url.clone(),
        )))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "afrikmarket=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting afrikmarket server...");

    // Missing required configuration aborts startup here
    let config = Config::load()?;

    // Connect to database
    let db = afrikmarket_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    afrikmarket_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = build_storage(&config)?;
    info!(backend = %config.storage.backend, "Storage backend ready");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let ad_repo = AdRepository::new(Arc::clone(&db));
    let session_repo = SessionRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let blog_repo = BlogPostRepository::new(Arc::clone(&db));
    let testimonial_repo = TestimonialRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(
        user_repo.clone(),
        ad_repo.clone(),
        session_repo.clone(),
        Arc::clone(&storage),
    );
    let session_service = SessionService::new(
        session_repo.clone(),
        user_repo.clone(),
        config.session.ttl_seconds,
    );
    let ad_service = AdService::new(ad_repo.clone(), Arc::clone(&storage));
    let notification_service = NotificationService::new(notification_repo);
    let moderation_service =
        ModerationService::new(ad_repo.clone(), notification_service.clone());
    let blog_service = BlogService::new(blog_repo.clone(), Arc::clone(&storage));
    let testimonial_service = TestimonialService::new(testimonial_repo);
    let stats_service = StatsService::new(ad_repo.clone(), user_repo.clone(), blog_repo);
    let sitemap_service = SitemapService::new(ad_repo, config.server.url.clone());

    // Sweep stale sessions from previous runs
    match session_repo.delete_expired().await {
        Ok(removed) if removed > 0 => info!(removed, "Removed expired sessions"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to sweep expired sessions"),
    }

    // Create app state
    let state = AppState {
        user_service,
        session_service,
        ad_service,
        moderation_service,
        notification_service,
        blog_service,
        testimonial_service,
        stats_service,
        sitemap_service,
        cookie_key: Key::derive_from(config.session.secret.as_bytes()),
    };

    // Build router. Up to 6 images of MAX_IMAGE_BYTES per submission, plus
    // form overhead.
    let router = api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(DefaultBodyLimit::max(8 * MAX_IMAGE_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Method override must rewrite the request before routing, so it wraps
    // the router instead of being a router layer.
    let app = axum::middleware::from_fn(method_override_middleware).layer(router);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, axum::ServiceExt::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
