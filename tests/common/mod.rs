//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_list_media() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated(&server);
//!
//!     let response = client.get_media_items().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```
#![allow(dead_code)] // Each test binary uses a different subset of this module.

mod client;
mod constants;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
pub use server::TestServer;
