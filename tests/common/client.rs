//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest and
//! provides methods for all geeklog-server endpoints. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use super::server::TestServer;
use reqwest::{header, Response};
use serde_json::Value;
use std::time::Duration;

/// HTTP test client with token-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication behavior. For most tests, use
    /// `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client authenticated as the server's primary test user.
    pub fn authenticated(server: &TestServer) -> Self {
        Self::with_token(server.base_url.clone(), &server.token)
    }

    /// Creates a client authenticated as the server's secondary test user.
    pub fn authenticated_other(server: &TestServer) -> Self {
        Self::with_token(server.base_url.clone(), &server.other_token)
    }

    /// Creates a client that sends the given session token on every request.
    pub fn with_token(base_url: String, token: &str) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(token).expect("token is a valid header value"),
        );
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Generic helpers
    // ========================================================================

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn post_empty(&self, path: &str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put_json(&self, path: &str, body: Value) -> Response {
        self.client
            .put(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// POST a multipart upload with one or more image parts.
    pub async fn post_images(&self, path: &str, images: Vec<&'static [u8]>) -> Response {
        let mut form = reqwest::multipart::Form::new();
        for (index, bytes) in images.into_iter().enumerate() {
            form = form.part(
                format!("file{}", index),
                reqwest::multipart::Part::bytes(bytes).file_name(format!("file{}.png", index)),
            );
        }
        self.client
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await
            .expect("multipart POST failed")
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn session(&self) -> Response {
        self.get("/v1/auth/session").await
    }

    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    // ========================================================================
    // Library
    // ========================================================================

    pub async fn add_media_item(&self, body: Value) -> Response {
        self.post_json("/v1/library/media", body).await
    }

    pub async fn get_media_items(&self) -> Response {
        self.get("/v1/library/media").await
    }

    pub async fn get_media_item(&self, id: &str) -> Response {
        self.get(&format!("/v1/library/media/{}", id)).await
    }

    pub async fn update_media_item(&self, id: &str, body: Value) -> Response {
        self.put_json(&format!("/v1/library/media/{}", id), body)
            .await
    }

    pub async fn delete_media_item(&self, id: &str) -> Response {
        self.delete(&format!("/v1/library/media/{}", id)).await
    }

    pub async fn upload_cover(&self, id: &str) -> Response {
        self.post_images(
            &format!("/v1/library/media/{}/cover", id),
            vec![TEST_PNG_BYTES],
        )
        .await
    }

    pub async fn add_review(&self, body: Value) -> Response {
        self.post_json("/v1/library/review", body).await
    }

    pub async fn get_reviews(&self) -> Response {
        self.get("/v1/library/reviews").await
    }

    pub async fn update_review(&self, id: &str, body: Value) -> Response {
        self.put_json(&format!("/v1/library/review/{}", id), body)
            .await
    }

    pub async fn delete_review(&self, id: &str) -> Response {
        self.delete(&format!("/v1/library/review/{}", id)).await
    }

    pub async fn add_milestone(&self, body: Value) -> Response {
        self.post_json("/v1/library/milestone", body).await
    }

    pub async fn get_milestones(&self) -> Response {
        self.get("/v1/library/milestones").await
    }

    pub async fn upload_milestone_images(
        &self,
        id: &str,
        images: Vec<&'static [u8]>,
    ) -> Response {
        self.post_images(&format!("/v1/library/milestone/{}/images", id), images)
            .await
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub async fn get_profile(&self) -> Response {
        self.get("/v1/profile/").await
    }

    pub async fn put_profile(&self, body: Value) -> Response {
        self.put_json("/v1/profile/", body).await
    }

    pub async fn upload_avatar(&self) -> Response {
        self.post_images("/v1/profile/avatar", vec![TEST_PNG_BYTES])
            .await
    }

    // ========================================================================
    // Gamification
    // ========================================================================

    pub async fn evaluate_achievements(&self) -> Response {
        self.post_empty("/v1/gamification/evaluate").await
    }

    pub async fn get_achievements(&self) -> Response {
        self.get("/v1/gamification/achievements").await
    }

    pub async fn touch_streak(&self) -> Response {
        self.post_empty("/v1/gamification/streak/touch").await
    }

    pub async fn get_streak(&self) -> Response {
        self.get("/v1/gamification/streak").await
    }

    pub async fn get_challenges(&self) -> Response {
        self.get("/v1/gamification/challenges").await
    }

    pub async fn refresh_challenges(&self) -> Response {
        self.post_empty("/v1/gamification/challenges/refresh").await
    }

    pub async fn get_recommendations(&self) -> Response {
        self.get("/v1/gamification/recommendations").await
    }

    pub async fn get_notifications(&self) -> Response {
        self.get("/v1/gamification/notifications").await
    }
}
