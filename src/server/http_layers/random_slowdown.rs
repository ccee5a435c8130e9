//! Dev-only middleware that delays every request by a random amount, to
//! exercise loading states in the frontend.
#![allow(dead_code)] // Only wired in with the `slowdown` feature.

use axum::{body::Body, http::Request, middleware::Next, response::IntoResponse};
use rand::Rng;
use std::time::Duration;

const MIN_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 900;

pub async fn slowdown_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let delay_ms = rand::rng().random_range(MIN_DELAY_MS..MAX_DELAY_MS);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    next.run(request).await
}
