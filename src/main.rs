use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use foundry_match::config::Settings;
use foundry_match::core::Ranker;
use foundry_match::routes::{self, auth::TokenVerifier, AppState};
use foundry_match::services::{
    CacheManager, CachedDirectory, ConnectionRegistry, HttpDirectory, InMemoryLedger, InteractionLedger,
    PostgresLedger, ProfileDirectory,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    // Environment wins over the config file
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_ledger(settings: &Settings) -> io::Result<Arc<dyn InteractionLedger>> {
    let Some(url) = settings.database.url.as_deref() else {
        warn!("No database URL configured, interactions are kept in memory only");
        return Ok(Arc::new(InMemoryLedger::new()));
    };

    let db = &settings.database;
    let ledger = PostgresLedger::from_settings(
        url,
        db.max_connections,
        db.min_connections,
        db.acquire_timeout_secs,
        db.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to initialize PostgreSQL ledger: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    info!(
        "PostgreSQL ledger initialized (max: {} connections)",
        db.max_connections.unwrap_or(10)
    );
    Ok(Arc::new(ledger))
}

async fn build_directory(settings: &Settings) -> io::Result<Arc<dyn ProfileDirectory>> {
    let http = HttpDirectory::new(
        settings.directory.base_url.clone(),
        settings.directory.api_key.clone(),
        Duration::from_secs(settings.directory.timeout_secs),
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let cache_cfg = &settings.cache;
    // The app works without Redis; degrade to the in-process tier
    let cache = match CacheManager::new(cache_cfg.redis_url.as_deref(), cache_cfg.l1_cache_size, cache_cfg.ttl_secs).await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to connect to Redis ({}), running with L1 cache only", e);
            CacheManager::in_process(cache_cfg.l1_cache_size, cache_cfg.ttl_secs)
        }
    };

    info!(
        "Directory client initialized for {} (L1: {} entries, L2: {}, TTL: {}s)",
        settings.directory.base_url,
        cache_cfg.l1_cache_size,
        cache.has_l2(),
        cache_cfg.ttl_secs
    );

    Ok(Arc::new(CachedDirectory::new(http, Arc::new(cache))))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings);
    info!("Starting Foundry match service...");

    let ledger = build_ledger(&settings).await?;
    let directory = build_directory(&settings).await?;

    let notif = &settings.notifications;
    let registry = Arc::new(ConnectionRegistry::new(notif.channel_buffer, notif.max_channels_per_user));

    let weights = settings.scoring.weights.to_weights();
    let ranker = Ranker::new(weights, settings.matching.limits());
    info!("Ranker initialized with weights: {:?}", weights);

    if settings.auth.jwt_secret.is_empty() {
        warn!("JWT secret is empty; every request will be rejected as unauthorized");
    }
    let verifier = TokenVerifier::new(&settings.auth.jwt_secret, settings.auth.issuer.as_deref());

    let app_state = AppState::new(
        ledger,
        directory,
        registry,
        ranker,
        verifier,
        Duration::from_secs(notif.keep_alive_secs.max(1)),
    );

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
