//! Gamification routes.
//!
//! Each endpoint re-reads the user's collections and runs the pure rule
//! components over them; there is no server-side aggregation or caching
//! beyond the gamification local cache.

use super::session::Session;
use super::state::*;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// One evaluation pass; returns the newly unlocked achievements for the
/// client's toast/animation feedback.
async fn post_evaluate(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.evaluate_achievements(session.user_id)).into_response()
}

async fn get_achievements(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.achievement_overview(session.user_id)).into_response()
}

async fn post_streak_touch(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.touch_streak(session.user_id)).into_response()
}

async fn get_streak(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.streak_status(session.user_id)).into_response()
}

async fn get_challenges(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.weekly_challenges(session.user_id)).into_response()
}

async fn post_challenges_refresh(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.refresh_weekly_progress(session.user_id)).into_response()
}

async fn get_recommendations(
    session: Session,
    State(gamification): State<GuardedGamificationService>,
) -> Response {
    Json(gamification.recommendations(session.user_id)).into_response()
}

async fn get_notifications(session: Session, State(state): State<ServerState>) -> Response {
    Json(
        state
            .gamification
            .notifications(session.user_id, state.config.notifications_limit),
    )
    .into_response()
}

pub(super) fn make_gamification_routes(state: ServerState) -> Router {
    Router::new()
        .route("/evaluate", post(post_evaluate))
        .route("/achievements", get(get_achievements))
        .route("/streak/touch", post(post_streak_touch))
        .route("/streak", get(get_streak))
        .route("/challenges", get(get_challenges))
        .route("/challenges/refresh", post(post_challenges_refresh))
        .route("/recommendations", get(get_recommendations))
        .route("/notifications", get(get_notifications))
        .with_state(state)
}
