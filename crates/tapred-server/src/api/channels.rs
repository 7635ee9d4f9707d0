//! Community channel routes: chat-like views over the shared content feed.
//!
//! A channel has no storage of its own. Messages are content records whose
//! text carries a channel tag; reading a channel means filtering the flat
//! feed by decoded subnet name, and posting means packing the tag before
//! forwarding. The requester's identity arrives as an explicit
//! `viewer_username` parameter; the server keeps no ambient user state.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tapred_core::channel;
use tapred_tapestry::{ContentProperty, CreateContentRequest, FeedItem};

use crate::middleware::RequestId;

use super::{map_tapestry_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(in crate::api) struct ChatMessage {
    pub id: String,
    pub content: String,
    pub author: ChatAuthor,
    pub created_at: Option<DateTime<Utc>>,
    pub is_own: bool,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ChatAuthor {
    pub username: String,
    pub avatar_url: Option<String>,
    pub wallet_address: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct MessagesQuery {
    viewer_username: Option<String>,
}

pub(in crate::api) async fn list_messages(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(subnet): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, ApiError> {
    let feed = state
        .tapestry
        .get_feed()
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: channel_messages(feed, &subnet, query.viewer_username.as_deref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Filters the flat feed down to one channel's messages, oldest first.
fn channel_messages(feed: Vec<FeedItem>, subnet: &str, viewer: Option<&str>) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = feed
        .into_iter()
        .filter_map(|item| {
            let text = item.content.text.as_deref().unwrap_or_default();
            let tag = channel::extract(text);
            if tag.subnet_name.as_deref() != Some(subnet) {
                return None;
            }
            Some(ChatMessage {
                id: item.content.id,
                content: tag.clean_text,
                created_at: item
                    .content
                    .created_at
                    .and_then(DateTime::from_timestamp_millis),
                is_own: viewer == Some(item.author_profile.username.as_str()),
                author: ChatAuthor {
                    username: item.author_profile.username,
                    avatar_url: item.author_profile.image,
                    wallet_address: item.author_profile.id,
                },
            })
        })
        .collect();

    messages.sort_by_key(|m| m.created_at);
    messages
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SendMessageBody {
    wallet_address: String,
    text: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SentMessage {
    pub id: String,
    pub subnet: String,
    pub text: String,
}

pub(in crate::api) async fn send_message(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(subnet): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<ApiResponse<SentMessage>>, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "message text must be non-empty",
        ));
    }

    let packed = channel::pack(text, &subnet);
    let content = state
        .tapestry
        .create_content(&CreateContentRequest {
            owner_wallet_address: body.wallet_address,
            content: packed,
            properties: vec![ContentProperty {
                key: "subnet".to_owned(),
                value: subnet.clone(),
            }],
        })
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SentMessage {
            id: content.id,
            subnet,
            text: text.to_owned(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
