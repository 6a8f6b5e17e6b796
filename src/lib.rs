pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub(crate) mod scope_path;
pub mod services;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method, Request};
use axum::routing::get;
use axum::Router;
use commands::{directory_commands, file_commands};
use config::Config;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, info_span, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CORS_MAX_AGE_SECS: u64 = 600;

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=info,file_browser=info,tower_http=info",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin.trim()) {
        Ok(value) => value,
        Err(_) => {
            warn!(origin, "invalid cors origin, CORS disabled");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::ORIGIN,
                HeaderName::from_static("x-requested-with"),
                header::CONTENT_TYPE,
                header::ACCEPT,
            ])
            .max_age(Duration::from_secs(CORS_MAX_AGE_SECS)),
    )
}

pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    let mut app = Router::new()
        .route(
            "/directories",
            get(directory_commands::list_directory)
                .post(directory_commands::create_directory)
                .put(directory_commands::rename_directory)
                .delete(directory_commands::delete_directory),
        )
        .route(
            "/files",
            get(file_commands::download_file)
                .post(file_commands::upload_files)
                .put(file_commands::rename_file)
                .delete(file_commands::delete_file)
                .layer(DefaultBodyLimit::disable()),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    if let Some(cors) = build_cors_layer(cors_origin) {
        app = app.layer(cors);
    }
    app
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("received termination signal, shutting down");
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    init_logging();

    let base = config
        .base_path()
        .context("could not determine a base path, pass --base-path")?;
    let state = AppState::from_base_path(&base)
        .with_context(|| format!("invalid base path {}", base.display()))?;
    let app = build_router(Arc::new(state), &config.cors_origin);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, base = %base.display(), "file browser listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{request, TestServer};
    use axum::http::StatusCode;

    #[test]
    fn invalid_cors_origin_disables_cors() {
        assert!(build_cors_layer("bad\norigin").is_none());
        assert!(build_cors_layer("http://localhost:8080").is_some());
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let server = TestServer::new();
        let mut req = request(Method::GET, "/directories?path=/");
        req.headers_mut().insert(
            header::ORIGIN,
            HeaderValue::from_static("http://localhost:8080"),
        );

        let response = server.send(req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:8080"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = TestServer::new();
        let response = server.send(request(Method::GET, "/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
