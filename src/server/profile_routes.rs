//! Profile routes.

use super::session::Session;
use super::state::*;
use crate::assets::AssetCategory;
use crate::user::UserProfile;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Serialize)]
struct UploadedAsset {
    url: String,
}

async fn get_profile(session: Session, State(user_store): State<GuardedUserStore>) -> Response {
    match user_store.get_user_profile(session.user_id) {
        Ok(Some(profile)) => Json(profile).into_response(),
        // A user who never saved a profile gets the defaults.
        Ok(None) => Json(UserProfile::default()).into_response(),
        Err(e) => {
            error!("Failed to get profile: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_profile(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Json(profile): Json<UserProfile>,
) -> Response {
    if let Err(e) = profile.validate() {
        return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
    }
    match user_store.set_user_profile(session.user_id, &profile) {
        Ok(()) => Json(profile).into_response(),
        Err(e) => {
            error!("Failed to store profile: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Shared flow for avatar and profile-cover uploads: store the image, then
/// point the profile field at it, replacing any previous asset.
async fn upload_profile_image(
    state: &ServerState,
    user_id: usize,
    category: AssetCategory,
    multipart: &mut Multipart,
) -> Response {
    let bytes = loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.bytes().await {
                Ok(bytes) if !bytes.is_empty() => break bytes.to_vec(),
                Ok(_) => continue,
                Err(_) => return StatusCode::BAD_REQUEST.into_response(),
            },
            Ok(None) => {
                return (StatusCode::UNPROCESSABLE_ENTITY, "No file in upload").into_response()
            }
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        }
    };

    let url = match state.asset_store.upload(category, bytes).await {
        Ok(url) => url,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let mut profile = match state.user_store.get_user_profile(user_id) {
        Ok(profile) => profile.unwrap_or_default(),
        Err(e) => {
            error!("Failed to get profile: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let previous = match category {
        AssetCategory::Avatar => profile.avatar_url.replace(url.clone()),
        AssetCategory::ProfileCover => profile.cover_url.replace(url.clone()),
        _ => None,
    };

    if let Err(e) = state.user_store.set_user_profile(user_id, &profile) {
        error!("Failed to store profile: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    if let Some(old_url) = previous {
        if old_url != url {
            if let Err(e) = state.asset_store.delete(&old_url).await {
                warn!("Failed to delete replaced profile image: {}", e);
            }
        }
    }

    Json(UploadedAsset { url }).into_response()
}

async fn post_avatar(
    session: Session,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Response {
    upload_profile_image(&state, session.user_id, AssetCategory::Avatar, &mut multipart).await
}

async fn post_cover(
    session: Session,
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Response {
    upload_profile_image(
        &state,
        session.user_id,
        AssetCategory::ProfileCover,
        &mut multipart,
    )
    .await
}

pub(super) fn make_profile_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_profile))
        .route("/", put(put_profile))
        .route("/avatar", post(post_avatar))
        .route("/cover", post(post_cover))
        .with_state(state)
}
