//! Follow-edge routes. Following a `Community_*` profile is what grants
//! membership in its channel, so these sit on the chat join path.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_tapestry_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct FollowBody {
    follower_username: String,
    followee_username: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct FollowAck {
    pub ok: bool,
}

pub(in crate::api) async fn follow(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<FollowBody>,
) -> Result<Json<ApiResponse<FollowAck>>, ApiError> {
    state
        .tapestry
        .follow(&body.follower_username, &body.followee_username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FollowAck { ok: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(in crate::api) async fn unfollow(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<FollowBody>,
) -> Result<Json<ApiResponse<FollowAck>>, ApiError> {
    state
        .tapestry
        .unfollow(&body.follower_username, &body.followee_username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FollowAck { ok: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct FollowStateQuery {
    follower_username: String,
    followee_username: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct FollowStateView {
    pub is_following: bool,
}

pub(in crate::api) async fn follow_state(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FollowStateQuery>,
) -> Result<Json<ApiResponse<FollowStateView>>, ApiError> {
    let is_following = state
        .tapestry
        .follow_state(&query.follower_username, &query.followee_username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FollowStateView { is_following },
        meta: ResponseMeta::new(req_id.0),
    }))
}
