use std::sync::Arc;

use actix_web::{web, HttpServer};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use am_core::{MemoryStore, TokenStore};
use am_infra::{FallbackStore, RedisClient, RedisStore};
use am_shared::config::{CacheConfig, CsrfConfig, IssueRateLimitConfig, ServerConfig};

use am_api::{create_app, CsrfState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Amora CSRF service");

    let server_config = ServerConfig::from_env();
    let csrf_config = CsrfConfig::from_env();
    let cache_config = CacheConfig::from_env();
    let rate_limit_config = IssueRateLimitConfig::from_env();

    // Prefer the redis-backed store; degrade to the in-process map when
    // redis is unreachable at startup. The fallback wrapper handles outages
    // that happen later.
    let store: Arc<dyn TokenStore> = match RedisClient::new(&cache_config).await {
        Ok(client) => {
            info!("redis token store active");
            let primary = match cache_config.key_prefix.clone() {
                Some(prefix) => RedisStore::with_prefix(client, prefix),
                None => RedisStore::new(client),
            };
            Arc::new(FallbackStore::new(primary))
        }
        Err(err) => {
            warn!(error = %err, "redis unavailable, falling back to in-process token store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = web::Data::new(CsrfState::new(store, csrf_config, rate_limit_config));

    let bind_address = server_config.bind_address();
    info!(address = %bind_address, "binding HTTP server");

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if server_config.workers > 0 {
        server = server.workers(server_config.workers);
    }
    server.bind(&bind_address)?.run().await
}
