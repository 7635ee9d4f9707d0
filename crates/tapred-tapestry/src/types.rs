//! Tapestry API request and response types.
//!
//! All types model the JSON structures exchanged with the Tapestry REST API.
//! Response shapes are deliberately lenient: optional fields default to
//! `None`/zero and unknown fields are ignored, since the upstream schema is
//! not under this repository's control.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Envelope for `GET /profiles`: `{ "profiles": [ ... ] }`.
#[derive(Debug, Deserialize)]
pub struct ProfilesResponse {
    #[serde(default)]
    pub profiles: Vec<ProfileItem>,
}

/// A profile together with its linked wallet and social counters.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileItem {
    pub profile: Profile,
    #[serde(default)]
    pub wallet: Option<Wallet>,
    #[serde(default, rename = "socialCounts")]
    pub social_counts: Option<SocialCounts>,
}

/// Core profile record.
///
/// `bio` is the opaque composite string; decoding it is the caller's concern.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Creation instant in epoch milliseconds, when the API provides one.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Wallet linked to a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Wallet {
    pub address: String,
}

/// Follower/following counters attached to a profile.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SocialCounts {
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub following: i64,
}

/// Body for `POST /profiles/findOrCreate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub username: String,
    pub owner_wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body for `PUT /profiles/{username}`.
#[derive(Debug, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Contents
// ---------------------------------------------------------------------------

/// Envelope for `GET /contents/`: `{ "contents": [ ... ] }`.
///
/// The list is flat and carries no ordering contract; callers sort.
#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub contents: Vec<FeedItem>,
}

/// One feed entry: the content record plus its author's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    pub content: Content,
    #[serde(rename = "authorProfile")]
    pub author_profile: Profile,
    #[serde(default, rename = "socialCounts")]
    pub social_counts: Option<ContentCounts>,
}

/// A content record. `text` is the opaque composite string.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Creation instant in epoch milliseconds.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Like/comment counters attached to a content record.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ContentCounts {
    #[serde(default, rename = "likeCount")]
    pub like_count: i64,
    #[serde(default, rename = "commentCount")]
    pub comment_count: i64,
}

/// Body for `POST /contents/`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    pub owner_wallet_address: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ContentProperty>,
}

/// A free-form key/value property attached to created content.
#[derive(Debug, Clone, Serialize)]
pub struct ContentProperty {
    pub key: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Comments, likes, follows
// ---------------------------------------------------------------------------

/// Body for `POST /comments/`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content_id: String,
    pub profile_id: String,
    pub text: String,
}

/// A created comment, as echoed back by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Body for like/unlike and follow/unfollow edges: `{startId, endId?}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EdgeRequest<'a> {
    pub start_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_id: Option<&'a str>,
}

/// Response for `GET /followers/state`.
#[derive(Debug, Deserialize)]
pub struct FollowStateResponse {
    #[serde(default, rename = "isFollowing")]
    pub is_following: bool,
}
