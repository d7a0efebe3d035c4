//! API route definitions.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};

use crate::middleware::rate_limit::{RateLimiter, rate_limit_middleware};
use crate::{AppState, middleware::auth::auth_middleware};

pub mod approval;
pub mod auth;
pub mod documents;
pub mod health;
pub mod import;
pub mod subaccounts;

/// Requests allowed per client on the public approval channel per window.
const APPROVAL_RATE_LIMIT: u32 = 30;

/// Window for the public approval channel limiter.
const APPROVAL_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(documents::routes())
        .merge(import::routes())
        .merge(subaccounts::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // The approval channel carries no caller authentication; the bearer
    // token is the whole credential, so it sits behind a rate limiter.
    let limiter = Arc::new(RateLimiter::new(APPROVAL_RATE_LIMIT, APPROVAL_RATE_WINDOW));
    let approval_routes = approval::routes().layer(middleware::from_fn_with_state(
        limiter,
        rate_limit_middleware,
    ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(approval_routes)
        .merge(protected_routes)
}
