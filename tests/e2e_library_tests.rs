//! End-to-end tests for library endpoints (media items, reviews, milestones)

mod common;

use common::{TestClient, TestServer, TEST_PNG_BYTES};
use reqwest::StatusCode;
use serde_json::json;

fn game_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "media_type": "game",
        "status": "planned"
    })
}

#[tokio::test]
async fn media_item_crud_over_http() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client.add_media_item(game_body("Hades")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: serde_json::Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["title"], "Hades");
    assert_eq!(created["status"], "planned");

    let response = client
        .update_media_item(&id, json!({ "status": "completed", "rating": 9, "hours_spent": 40.5 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["rating"], 9);

    // Explicit null clears the rating; absent fields stay untouched.
    let response = client.update_media_item(&id, json!({ "rating": null })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared: serde_json::Value = response.json().await.unwrap();
    assert!(cleared["rating"].is_null());
    assert_eq!(cleared["status"], "completed");

    let response = client.delete_media_item(&id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = client.get_media_item(&id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client
        .add_media_item(json!({
            "title": "x",
            "media_type": "game",
            "status": "planned",
            "rating": 11
        }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn media_items_are_isolated_between_users() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);
    let other = TestClient::authenticated_other(&server);

    let response = client.add_media_item(game_body("Private")).await;
    let created: serde_json::Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let response = other.get_media_item(id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = other.get_media_items().await;
    let items: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn cover_upload_sets_and_serves_the_image() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client.add_media_item(game_body("Celeste")).await;
    let created: serde_json::Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let response = client.upload_cover(id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/covers/"));

    let response = client.get_media_item(id).await;
    let item: serde_json::Value = response.json().await.unwrap();
    assert_eq!(item["cover_url"], url.as_str());

    // The stored image is served back with an image content type.
    let response = client.get(&url).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("image/"));
}

#[tokio::test]
async fn review_join_tolerates_deleted_media() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client.add_media_item(game_body("Outer Wilds")).await;
    let created: serde_json::Value = response.json().await.unwrap();
    let media_id = created["id"].as_str().unwrap().to_string();

    let response = client
        .add_review(json!({
            "media_id": media_id,
            "title": "Go in blind",
            "content": "A **perfect** loop.",
            "rating": 10
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.get_reviews().await;
    let reviews: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["media_title"], "Outer Wilds");

    // Deleting the media item leaves the review dangling but listable.
    client.delete_media_item(&media_id).await;
    let response = client.get_reviews().await;
    let reviews: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert!(reviews[0]["media_title"].is_null());
    assert_eq!(reviews[0]["media_id"], media_id.as_str());
}

#[tokio::test]
async fn review_content_is_a_closed_ast() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client
        .add_review(json!({
            "media_id": "whatever",
            "title": "styled",
            "content": "plain and **bold**\n\n- a list item",
            "rating": 8
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let review: serde_json::Value = response.json().await.unwrap();

    let blocks = review["content"]["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["type"], "paragraph");
    assert_eq!(blocks[1]["type"], "list");

    // Unclosed markers are rejected at the boundary.
    let response = client
        .add_review(json!({
            "media_id": "whatever",
            "title": "broken",
            "content": "oops **bold",
            "rating": 5
        }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn milestone_accepts_at_most_two_images() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server);

    let response = client
        .add_milestone(json!({
            "title": "100 games",
            "description": "A round number.",
            "icon": "🎮",
            "date": "2026-03-01"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let milestone: serde_json::Value = response.json().await.unwrap();
    let id = milestone["id"].as_str().unwrap();

    let response = client
        .upload_milestone_images(id, vec![TEST_PNG_BYTES, TEST_PNG_BYTES])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: serde_json::Value = response.json().await.unwrap();
    // Identical bytes hash to the same asset, so dedup to one url is fine;
    // the point is the count never exceeds two.
    assert!(updated["images"].as_array().unwrap().len() <= 2);

    let response = client
        .upload_milestone_images(
            id,
            vec![TEST_PNG_BYTES, TEST_PNG_BYTES, TEST_PNG_BYTES],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
