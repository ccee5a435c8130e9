//! Library routes: media items, reviews and milestones.

use super::session::Session;
use super::state::*;
use crate::assets::AssetCategory;
use crate::library::models::double_option;
use crate::library::{
    MediaItemUpdate, MilestoneUpdate, NewMediaItem, NewMilestone, NewReview, ResolvedReview,
    ReviewUpdate, MILESTONE_MAX_IMAGES,
};
use crate::richtext::RichText;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

#[derive(Deserialize, Debug)]
struct CreateReviewBody {
    pub media_id: String,
    pub title: String,
    /// Restricted markup, parsed into the rich-text AST.
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub favorite: bool,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct UpdateReviewBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<u8>,
    pub favorite: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct CreateMilestoneBody {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub media_id: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct UpdateMilestoneBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(deserialize_with = "double_option")]
    pub media_id: Option<Option<String>>,
}

#[derive(Serialize)]
struct UploadedAsset {
    url: String,
}

fn rating_in_range(rating: Option<u8>) -> bool {
    rating.is_none_or(|r| r <= 10)
}

fn hours_non_negative(hours: Option<f64>) -> bool {
    hours.is_none_or(|h| h >= 0.0)
}

fn parse_content(markup: &str) -> Result<RichText, Response> {
    RichText::parse(markup)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response())
}

/// Pulls the first non-empty file out of a multipart upload.
async fn read_upload_bytes(multipart: &mut Multipart) -> Result<Vec<u8>, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST.into_response())?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|_| StatusCode::BAD_REQUEST.into_response())?;
        if !bytes.is_empty() {
            return Ok(bytes.to_vec());
        }
    }
    Err((StatusCode::UNPROCESSABLE_ENTITY, "No file in upload").into_response())
}

async fn post_media_item(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Json(body): Json<NewMediaItem>,
) -> Response {
    if !rating_in_range(body.rating) || !hours_non_negative(body.hours_spent) {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    match library_store.add_media_item(session.user_id, body) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => {
            error!("Failed to add media item: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_media_items(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
) -> Response {
    match library_store.get_media_items(session.user_id) {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            error!("Failed to list media items: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_media_item(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library_store.get_media_item(session.user_id, &id) {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to get media item {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_media_item(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    Json(body): Json<MediaItemUpdate>,
) -> Response {
    if !rating_in_range(body.rating.flatten()) || !hours_non_negative(body.hours_spent.flatten()) {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    match library_store.update_media_item(session.user_id, &id, body) {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to update media item {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_media_item(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.library_store.delete_media_item(session.user_id, &id) {
        Ok(Some(item)) => {
            // Cascade: a deleted item takes its cover image with it.
            if let Some(cover_url) = item.cover_url {
                if let Err(e) = state.asset_store.delete(&cover_url).await {
                    warn!("Failed to delete cover for media item {}: {}", id, e);
                }
            }
            StatusCode::OK.into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to delete media item {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_media_cover(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let previous = match state.library_store.get_media_item(session.user_id, &id) {
        Ok(Some(item)) => item,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to get media item {}: {}", id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let bytes = match read_upload_bytes(&mut multipart).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let url = match state.asset_store.upload(AssetCategory::Cover, bytes).await {
        Ok(url) => url,
        Err(e) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
        }
    };

    let update = MediaItemUpdate {
        cover_url: Some(Some(url.clone())),
        ..MediaItemUpdate::default()
    };
    match state
        .library_store
        .update_media_item(session.user_id, &id, update)
    {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to store cover url for media item {}: {}", id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    if let Some(old_url) = previous.cover_url {
        if old_url != url {
            if let Err(e) = state.asset_store.delete(&old_url).await {
                warn!("Failed to delete replaced cover {}: {}", old_url, e);
            }
        }
    }

    Json(UploadedAsset { url }).into_response()
}

async fn post_review(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Json(body): Json<CreateReviewBody>,
) -> Response {
    if body.rating > 10 {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    let content = match parse_content(&body.content) {
        Ok(content) => content,
        Err(response) => return response,
    };
    let review = NewReview {
        media_id: body.media_id,
        title: body.title,
        content,
        rating: body.rating,
        favorite: body.favorite,
    };
    match library_store.add_review(session.user_id, review) {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(e) => {
            error!("Failed to add review: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_reviews(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
) -> Response {
    let reviews = match library_store.get_reviews(session.user_id) {
        Ok(reviews) => reviews,
        Err(e) => {
            error!("Failed to list reviews: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Display join; a dangling media_id simply resolves to no title.
    let resolved: Vec<ResolvedReview> = reviews
        .into_iter()
        .map(|review| {
            let media_title = library_store
                .get_media_item(session.user_id, &review.media_id)
                .ok()
                .flatten()
                .map(|item| item.title);
            ResolvedReview {
                review,
                media_title,
            }
        })
        .collect();
    Json(resolved).into_response()
}

async fn get_review(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library_store.get_review(session.user_id, &id) {
        Ok(Some(review)) => Json(review).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to get review {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_review(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    Json(body): Json<UpdateReviewBody>,
) -> Response {
    if body.rating.is_some_and(|r| r > 10) {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    let content = match body.content {
        Some(markup) => match parse_content(&markup) {
            Ok(content) => Some(content),
            Err(response) => return response,
        },
        None => None,
    };
    let update = ReviewUpdate {
        title: body.title,
        content,
        rating: body.rating,
        favorite: body.favorite,
    };
    match library_store.update_review(session.user_id, &id, update) {
        Ok(Some(review)) => Json(review).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to update review {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_review(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
) -> Response {
    match library_store.delete_review(session.user_id, &id) {
        Ok(Some(_)) => StatusCode::OK.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to delete review {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_milestone(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Json(body): Json<CreateMilestoneBody>,
) -> Response {
    let description = match parse_content(&body.description) {
        Ok(description) => description,
        Err(response) => return response,
    };
    let milestone = NewMilestone {
        title: body.title,
        description,
        icon: body.icon,
        date: body.date,
        media_id: body.media_id,
    };
    match library_store.add_milestone(session.user_id, milestone) {
        Ok(milestone) => (StatusCode::CREATED, Json(milestone)).into_response(),
        Err(e) => {
            error!("Failed to add milestone: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_milestones(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
) -> Response {
    match library_store.get_milestones(session.user_id) {
        Ok(milestones) => Json(milestones).into_response(),
        Err(e) => {
            error!("Failed to list milestones: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_milestone(
    session: Session,
    State(library_store): State<GuardedLibraryStore>,
    Path(id): Path<String>,
    Json(body): Json<UpdateMilestoneBody>,
) -> Response {
    let description = match body.description {
        Some(markup) => match parse_content(&markup) {
            Ok(description) => Some(description),
            Err(response) => return response,
        },
        None => None,
    };
    let update = MilestoneUpdate {
        title: body.title,
        description,
        icon: body.icon,
        date: body.date,
        media_id: body.media_id,
    };
    match library_store.update_milestone(session.user_id, &id, update) {
        Ok(Some(milestone)) => Json(milestone).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to update milestone {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_milestone_images(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let previous = match state.library_store.get_milestones(session.user_id) {
        Ok(milestones) => match milestones.into_iter().find(|m| m.id == id) {
            Some(milestone) => milestone,
            None => return StatusCode::NOT_FOUND.into_response(),
        },
        Err(e) => {
            error!("Failed to list milestones: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut urls = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        };
        if bytes.is_empty() {
            continue;
        }
        if urls.len() == MILESTONE_MAX_IMAGES {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": format!("At most {} images per milestone", MILESTONE_MAX_IMAGES) })
                    .to_string(),
            )
                .into_response();
        }
        match state
            .asset_store
            .upload(AssetCategory::Milestone, bytes.to_vec())
            .await
        {
            Ok(url) => urls.push(url),
            Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
        }
    }

    match state
        .library_store
        .set_milestone_images(session.user_id, &id, urls)
    {
        Ok(Some(milestone)) => {
            for old_url in previous.images {
                if !milestone.images.contains(&old_url) {
                    if let Err(e) = state.asset_store.delete(&old_url).await {
                        warn!("Failed to delete replaced milestone image: {}", e);
                    }
                }
            }
            Json(milestone).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to set milestone images for {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_milestone(
    session: Session,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.library_store.delete_milestone(session.user_id, &id) {
        Ok(Some(milestone)) => {
            for image_url in milestone.images {
                if let Err(e) = state.asset_store.delete(&image_url).await {
                    warn!("Failed to delete milestone image {}: {}", image_url, e);
                }
            }
            StatusCode::OK.into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to delete milestone {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(super) fn make_library_routes(state: ServerState) -> Router {
    Router::new()
        .route("/media", post(post_media_item))
        .route("/media", get(get_media_items))
        .route("/media/{id}", get(get_media_item))
        .route("/media/{id}", put(put_media_item))
        .route("/media/{id}", delete(delete_media_item))
        .route("/media/{id}/cover", post(post_media_cover))
        .route("/reviews", get(get_reviews))
        .route("/review", post(post_review))
        .route("/review/{id}", get(get_review))
        .route("/review/{id}", put(put_review))
        .route("/review/{id}", delete(delete_review))
        .route("/milestones", get(get_milestones))
        .route("/milestone", post(post_milestone))
        .route("/milestone/{id}", put(put_milestone))
        .route("/milestone/{id}", delete(delete_milestone))
        .route("/milestone/{id}/images", post(post_milestone_images))
        .with_state(state)
}
