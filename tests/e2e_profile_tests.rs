//! End-to-end tests for profile endpoints

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn fresh_user_gets_default_profile() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client.get_profile().await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["display_name"], "");
    assert_eq!(profile["theme"], "system");
    assert_eq!(profile["default_sort"], "recently_updated");
}

#[tokio::test]
async fn profile_round_trips_with_favorites() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let body = json!({
        "display_name": "Ana",
        "bio": "catalogging everything",
        "theme": "dark",
        "default_sort": "rating",
        "favorites": {
            "games": [
                { "name": "Hollow Knight" },
                { "name": "Hades", "image_url": "/media/covers/abc.png" }
            ],
            "characters": [{ "name": "Zagreus" }]
        }
    });
    let response = client.put_profile(body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get_profile().await;
    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["display_name"], "Ana");
    assert_eq!(profile["theme"], "dark");
    assert_eq!(profile["favorites"]["games"].as_array().unwrap().len(), 2);
    assert_eq!(profile["favorites"]["movies"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn more_than_three_favorites_per_shelf_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let body = json!({
        "display_name": "Ana",
        "favorites": {
            "movies": [
                { "name": "a" }, { "name": "b" }, { "name": "c" }, { "name": "d" }
            ]
        }
    });
    let response = client.put_profile(body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn avatar_upload_lands_in_the_profile() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client.upload_avatar().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/avatars/"));

    let response = client.get_profile().await;
    let profile: serde_json::Value = response.json().await.unwrap();
    assert_eq!(profile["avatar_url"], url.as_str());
}
