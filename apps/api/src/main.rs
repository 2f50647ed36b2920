use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intake::auth::gotrue::GoTrueClient;
use intake::auth::AuthGateway;
use intake::config::Config;
use intake::db::create_pool;
use intake::presentation::SessionMirror;
use intake::routes::build_router;
use intake::state::AppState;
use intake::storage::S3ObjectStorage;
use intake::store::postgres::PgStore;
use intake::submission::ApplicationAssembler;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; a missing variable aborts startup
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting intake API v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(PgStore::new(pool));

    let s3 = build_s3_client(&config).await;
    let storage = Arc::new(S3ObjectStorage::new(s3, config.storage_public_url.clone()));
    info!("Object storage ready (bucket: {})", config.s3_bucket);

    let auth_client = GoTrueClient::new(config.auth_url.clone(), config.auth_anon_key.clone())?;
    let auth = Arc::new(AuthGateway::new(Arc::new(auth_client)));

    // Log admin sign-ins and sign-outs for as long as the gateway lives
    tokio::spawn(
        SessionMirror::default().follow(auth.on_auth_state_change(), |mirror| {
            match mirror.current_user() {
                Some(user) => info!(
                    "Admin session active: {}",
                    user.email.as_deref().unwrap_or(&user.id)
                ),
                None => info!("Admin session ended"),
            }
        }),
    );

    let assembler = ApplicationAssembler::new(
        store.clone(),
        storage,
        config.s3_bucket.clone(),
        config.upload_limits,
    );
    info!(
        "Upload limits: photo {} bytes, CV {} bytes",
        config.upload_limits.photo_max_bytes, config.upload_limits.cv_max_bytes
    );

    let state = AppState {
        applications: store.clone(),
        jobs: store,
        assembler: Arc::new(assembler),
        auth,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}, serving frontend from {}", config.static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3-compatible client for the hosted storage endpoint (path-style addressing).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "intake-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
