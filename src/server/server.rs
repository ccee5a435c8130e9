use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, response, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::error;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    gamification_routes::make_gamification_routes, library_routes::make_library_routes,
    log_requests, profile_routes::make_profile_routes, session::Session, state::*, ServerConfig,
};
use crate::assets::AssetStore;
use crate::gamification::GamificationService;
use crate::library::LibraryStore;
use crate::notifications::NotificationDispatcher;
use crate::user::{AuthTokenValue, UserAuthTokenStore, UserStore};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

#[derive(Serialize)]
struct SessionInfo {
    pub user_id: usize,
    pub handle: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

async fn get_session(
    session: Session,
    State(user_store): State<GuardedUserStore>,
) -> Response {
    let handle = user_store.get_user_handle(session.user_id).unwrap_or(None);
    Json(SessionInfo {
        user_id: session.user_id,
        handle,
    })
    .into_response()
}

async fn logout(State(user_store): State<GuardedUserStore>, session: Session) -> Response {
    match user_store.delete_user_auth_token(&AuthTokenValue(session.token)) {
        Ok(_) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn get_asset(
    _session: Session,
    State(asset_store): State<GuardedAssetStore>,
    Path((category, file)): Path<(String, String)>,
) -> Response {
    let url = format!("/media/{}/{}", category, file);
    let Some(file_path) = asset_store.resolve(&url) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let buffer = match std::fs::read(&file_path) {
        Ok(buffer) => buffer,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            error!("Failed to read asset {:?}: {}", file_path, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Some(kind) = infer::get(&buffer) {
        if kind.mime_type().starts_with("image/") {
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, kind.mime_type().to_string())
                .body(buffer.into())
                .unwrap();
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

impl ServerState {
    fn new(
        config: ServerConfig,
        library_store: Arc<dyn LibraryStore>,
        user_store: Arc<dyn UserStore>,
        asset_store: Arc<dyn AssetStore>,
        gamification: Arc<GamificationService>,
        notifier: Arc<NotificationDispatcher>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            library_store,
            user_store,
            asset_store,
            gamification,
            notifier,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    library_store: Arc<dyn LibraryStore>,
    user_store: Arc<dyn UserStore>,
    asset_store: Arc<dyn AssetStore>,
    gamification: Arc<GamificationService>,
    notifier: Arc<NotificationDispatcher>,
) -> Router {
    let state = ServerState::new(
        config.clone(),
        library_store,
        user_store,
        asset_store,
        gamification,
        notifier,
    );

    let auth_routes: Router = Router::new()
        .route("/session", get(get_session))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let media_routes: Router = Router::new()
        .route("/{category}/{file}", get(get_asset))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    #[allow(unused_mut)]
    let mut app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/library", make_library_routes(state.clone()))
        .nest("/v1/profile/", make_profile_routes(state.clone()))
        .nest("/v1/gamification", make_gamification_routes(state.clone()))
        .nest("/media", media_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app.layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    library_store: Arc<dyn LibraryStore>,
    user_store: Arc<dyn UserStore>,
    asset_store: Arc<dyn AssetStore>,
    gamification: Arc<GamificationService>,
    notifier: Arc<NotificationDispatcher>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(
        config,
        library_store,
        user_store,
        asset_store,
        gamification,
        notifier,
    );

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
