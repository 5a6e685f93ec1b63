/*
 * Responsibility
 * - Config -> token factories -> registry -> Router
 * - Factories are built once, before serving, and never change afterwards
 * - axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::basic::BASIC_SCHEME;
use crate::services::auth::bearer::BEARER_SCHEME;
use crate::services::auth::{
    BasicTokenFactory, BearerTokenFactory, CompactJwsParser, StaticKeyResolver, TokenFactories,
};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,credgate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash loudly; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    info!(
        "starting credgate in {:?} mode on {}",
        config.app_env, config.addr
    );

    let state = AppState::new(build_factories(&config)?);
    info!(schemes = ?state.factories.schemes(), "token factories ready");

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_factories(config: &Config) -> Result<TokenFactories> {
    let mut factories = TokenFactories::new();

    if !config.basic_auth_keys.is_empty() {
        // A few bad entries must not take the good ones down with them,
        // but the operator has to hear about it.
        let basic = match BasicTokenFactory::from_list(&config.basic_auth_keys) {
            Ok(basic) => basic,
            Err(err) => {
                warn!(
                    failed = err.errors().len(),
                    error = %err,
                    "some basic auth keys were skipped"
                );
                err.into_partial()
            }
        };
        info!(users = basic.len(), "basic auth enabled");
        factories = factories.with(BASIC_SCHEME, Arc::new(basic));
    }

    if config.bearer_enabled() {
        let mut resolver = StaticKeyResolver::new();
        for key in &config.jwt_hmac_keys {
            resolver = resolver.with_hmac_secret(key.key_id.clone(), key.secret.as_bytes());
        }
        if let Some(ed) = &config.jwt_ed_key {
            resolver = resolver.with_ed_pem(ed.key_id.clone(), &ed.public_key_pem)?;
        }
        let keys = resolver.len();

        let bearer = BearerTokenFactory::new(
            config.jwt_default_key_id.clone(),
            Arc::new(resolver),
            Arc::new(CompactJwsParser::new(config.jwt_leeway_seconds)),
        );
        info!(
            keys,
            default_kid = %bearer.default_key_id(),
            "bearer auth enabled"
        );
        factories = factories.with(BEARER_SCHEME, Arc::new(bearer));
    }

    Ok(factories)
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(router, config.request_timeout)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AppEnv, HmacKey};

    fn config() -> Config {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            app_env: AppEnv::Development,
            request_timeout: Duration::from_secs(5),
            basic_auth_keys: vec![
                STANDARD.encode("user:pass"),
                "not base64!".to_string(),
            ],
            jwt_default_key_id: "default".to_string(),
            jwt_hmac_keys: vec![HmacKey {
                key_id: "default".to_string(),
                secret: "app-test-secret".to_string(),
            }],
            jwt_ed_key: None,
            jwt_leeway_seconds: 0,
        }
    }

    fn app() -> Router {
        let config = config();
        let state = AppState::new(build_factories(&config).unwrap());
        build_router(state, &config)
    }

    async fn get(path: &str, auth: Option<String>) -> (StatusCode, Value) {
        let mut req = Request::get(path);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let resp = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[test]
    fn partial_basic_key_list_still_registers_basic() {
        let factories = build_factories(&config()).unwrap();
        assert_eq!(factories.schemes(), vec!["basic", "bearer"]);
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = get("/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn whoami_requires_credentials() {
        let (status, body) = get("/api/v1/whoami", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "MissingHeader");
    }

    #[tokio::test]
    async fn whoami_with_basic_returns_token() {
        let auth = format!("Basic {}", STANDARD.encode("user:pass"));
        let (status, body) = get("/api/v1/whoami", Some(auth)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "scheme": "basic", "principal": "user", "attributes": {} })
        );
    }

    #[tokio::test]
    async fn whoami_with_bearer_returns_claims() {
        let jwt = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": "svc-a", "scope": "read" }),
            &EncodingKey::from_secret(b"app-test-secret"),
        )
        .unwrap();

        let (status, body) = get("/api/v1/whoami", Some(format!("Bearer {jwt}"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheme"], "jwt");
        assert_eq!(body["principal"], "svc-a");
        assert_eq!(body["attributes"]["scope"], "read");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().contains_key("x-request-id"));
    }
}
