//! Global feed, comments, and likes: thin reshaping proxies.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tapred_core::channel;
use tapred_tapestry::types::CreateCommentRequest;
use tapred_tapestry::FeedItem;

use crate::middleware::RequestId;

use super::{map_tapestry_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// A feed entry as served to the browser, channel tag already decoded.
#[derive(Debug, Serialize)]
pub(in crate::api) struct FeedPostItem {
    pub id: String,
    pub text: String,
    pub subnet: Option<String>,
    pub author_id: String,
    pub author_username: String,
    pub author_image: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub like_count: i64,
    pub comment_count: i64,
}

impl FeedPostItem {
    fn from_item(item: FeedItem) -> Self {
        let raw = item.content.text.unwrap_or_default();
        let tag = channel::extract(&raw);
        let counts = item.social_counts.unwrap_or_default();
        Self {
            id: item.content.id,
            text: tag.clean_text,
            subnet: tag.subnet_name,
            author_id: item.author_profile.id,
            author_username: item.author_profile.username,
            author_image: item.author_profile.image,
            created_at: item
                .content
                .created_at
                .and_then(DateTime::from_timestamp_millis),
            like_count: counts.like_count,
            comment_count: counts.comment_count,
        }
    }
}

pub(in crate::api) async fn get_feed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<FeedPostItem>>>, ApiError> {
    let feed = state
        .tapestry
        .get_feed()
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: feed.into_iter().map(FeedPostItem::from_item).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CommentBody {
    content_id: String,
    profile_id: String,
    text: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CommentView {
    pub id: String,
    pub text: Option<String>,
}

pub(in crate::api) async fn create_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CommentBody>,
) -> Result<Json<ApiResponse<CommentView>>, ApiError> {
    if body.content_id.is_empty() || body.profile_id.is_empty() || body.text.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "content_id, profile_id, and text are required",
        ));
    }

    let comment = state
        .tapestry
        .create_comment(&CreateCommentRequest {
            content_id: body.content_id,
            profile_id: body.profile_id,
            text: body.text,
        })
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CommentView {
            id: comment.id,
            text: comment.text,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct Ack {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct LikeBody {
    profile_id: String,
}

pub(in crate::api) async fn like_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(node_id): Path<String>,
    Json(body): Json<LikeBody>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    state
        .tapestry
        .like(&node_id, &body.profile_id)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Ack { ok: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UnlikeQuery {
    profile_id: String,
}

pub(in crate::api) async fn unlike_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(node_id): Path<String>,
    Query(query): Query<UnlikeQuery>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    state
        .tapestry
        .unlike(&node_id, &query.profile_id)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Ack { ok: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
