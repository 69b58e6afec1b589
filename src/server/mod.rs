//! HTTP surface of the app.
//!
//! [`router`] assembles the routes with the session gate and the outer
//! layers, from the outside in:
//!
//! 1. request tracing
//! 2. panic recovery: a panicking handler becomes a 500 JSON response
//! 3. the request timeout: an overrunning request becomes a 504 JSON response
//! 4. the browser session, read by the gate and written by the install callback
//!
//! # Example
//!
//! ```rust,no_run
//! use shopify_popup::server::{router, AppState};
//! use shopify_popup::AppConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let addr = config.bind_addr();
//! let app = router(AppState::in_memory(config)?);
//!
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod extract;
mod routes;
mod session;
mod state;

pub use error::ApiError;
pub use extract::{is_public_path, session_gate, RequireSession};
pub use routes::CALLBACK_PATH;
pub use session::{SESSION_COOKIE_NAME, SESSION_EXPIRY_SECS};
pub use state::AppState;

use std::any::Any;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{Request, Response},
    middleware,
    response::IntoResponse,
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

/// Builds the app router over `state`.
pub fn router(state: AppState) -> Router {
    let timeout = state.config().request_timeout();
    let secret = state.config().session_secret().clone();

    let app = Router::new()
        .merge(routes::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state);

    session::with_sessions(app, &secret).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<_>| {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            // The callback query carries the authorization code
                            path = %request.uri().path(),
                            status = tracing::field::Empty,
                            latency_ms = tracing::field::Empty,
                        )
                    })
                    .on_response(
                        |response: &Response<_>, latency: Duration, span: &Span| {
                            span.record("status", response.status().as_u16());
                            span.record(
                                "latency_ms",
                                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                            );
                            DefaultOnResponse::default().on_response(response, latency, span);
                        },
                    ),
            )
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(HandleErrorLayer::new(middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn middleware_error(error: BoxError) -> ApiError {
    if error.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Internal(error.to_string())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let message = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    ApiError::Internal(format!("handler panicked: {message}")).into_response()
}
