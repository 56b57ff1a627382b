use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tracing::{error, info, warn};

use gridiron_core::oidc::{OidcHttpClient, ProviderConfig, ProviderRegistry};
use gridiron_core::service::{AuthService, SessionService};
use gridiron_core::session::{
    CookieSigner, MemorySessionStore, RedisSessionStore, SessionStore,
};
use gridiron_core::{logging, Config};

use gridiron_api::http::{self, AppState, SessionCookieConfig};

#[derive(Debug, Parser)]
#[command(name = "gridiron-api", about = "Gridiron dashboard API server")]
struct Args {
    /// Path to the configuration file
    #[arg(long, env = "GRIDIRON_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    logging::init_logging(&config.logging)?;
    info!(
        environment = %config.server.environment,
        "gridiron api starting"
    );

    // One HTTP client for discovery, exchange and key fetches; its timeout
    // bounds every outbound protocol call.
    let oidc_http = OidcHttpClient::new(Duration::from_secs(config.auth.http_timeout_seconds))?;

    let registry = Arc::new(ProviderRegistry::new(oidc_http.clone()));
    register_providers(&registry, &config).await;
    if registry.is_empty().await {
        warn!("no identity providers registered; login is unavailable");
    }

    let store = build_session_store(&config).await?;
    let sessions = Arc::new(SessionService::new(
        store,
        Duration::from_secs(config.session.max_age_seconds),
    ));

    let cookie_config = Arc::new(SessionCookieConfig {
        name: config.session.cookie_name.clone(),
        signer: CookieSigner::new(&session_secret(&config)),
        secure: config.server.environment == "production",
    });

    let auth_service = Arc::new(AuthService::new(registry.clone(), oidc_http));

    let state = AppState {
        registry,
        auth_service,
        sessions,
        cookie_config,
        environment: config.server.environment.clone(),
    };
    let app = http::create_router(state);

    let addr = config.http_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Register every configured provider concurrently. A provider whose
/// discovery fails is disabled; the rest stay usable.
async fn register_providers(registry: &Arc<ProviderRegistry>, config: &Config) {
    let registrations = config.auth.providers.iter().map(|settings| {
        let registry = registry.clone();
        let provider_config = ProviderConfig {
            name: settings.name.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            issuer: settings.issuer.clone(),
            scopes: settings.scopes.clone(),
            base_callback_url: config.auth.base_callback_url.clone(),
        };
        async move {
            let name = provider_config.name.clone();
            (name, registry.register(provider_config).await)
        }
    });

    for (name, result) in futures::future::join_all(registrations).await {
        if let Err(e) = result {
            error!(provider = %name, error = %e, "provider registration failed; provider disabled");
        }
    }
}

async fn build_session_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match config.session.backend.as_str() {
        "redis" => {
            let store = RedisSessionStore::connect(
                &config.session.redis_url,
                config.session.redis_key_prefix.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect session store: {e}"))?;
            info!("using redis session store");
            Ok(Arc::new(store))
        }
        "memory" => {
            info!("using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        other => Err(anyhow::anyhow!("unknown session backend: {other}")),
    }
}

/// Cookie-signing key from config, or a process-local random key when none
/// is configured (sessions then die with the process).
fn session_secret(config: &Config) -> Vec<u8> {
    if config.session.secret.is_empty() {
        warn!("session.secret not set; generated an ephemeral key, sessions will not survive restarts");
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        key.to_vec()
    } else {
        config.session.secret.clone().into_bytes()
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
