//! Profile routes: lookup, creation, update, and FairScore refresh.
//!
//! The upstream profile store has no field for a reputation score, so every
//! bio that crosses this module goes through the score codec: reads decode
//! the composite string, writes re-pack any cached score over the new clean
//! text.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tapred_core::fairscore;
use tapred_tapestry::{CreateProfileRequest, ProfileItem, ProfileLookup, UpdateProfileRequest};

use crate::middleware::RequestId;

use super::{map_fairscale_error, map_tapestry_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// A profile as served to the browser: bio already decoded to clean text.
#[derive(Debug, Serialize)]
pub(in crate::api) struct ProfileView {
    pub id: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
    pub wallet_address: Option<String>,
    pub followers: i64,
    pub following: i64,
}

impl ProfileView {
    fn from_item(item: ProfileItem) -> Self {
        let extraction = fairscore::extract(item.profile.bio.as_deref());
        let counts = item.social_counts.unwrap_or_default();
        Self {
            id: item.profile.id,
            username: item.profile.username,
            bio: extraction.clean_bio,
            image: item.profile.image,
            wallet_address: item.wallet.map(|w| w.address),
            followers: counts.followers,
            following: counts.following,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProfileDetail {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub fair_score: Option<i64>,
    pub fair_score_captured_at: Option<DateTime<Utc>>,
    pub fair_score_fresh: bool,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ProfileListQuery {
    wallet_address: Option<String>,
    username: Option<String>,
}

pub(in crate::api) async fn list_profiles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProfileListQuery>,
) -> Result<Json<ApiResponse<Vec<ProfileView>>>, ApiError> {
    let lookup = match (&query.wallet_address, &query.username) {
        (Some(wallet), _) => ProfileLookup::WalletAddress(wallet),
        (None, Some(username)) => ProfileLookup::Username(username),
        (None, None) => {
            return Err(ApiError::new(
                req_id.0,
                "bad_request",
                "wallet_address or username is required",
            ));
        }
    };

    let items = state
        .tapestry
        .find_profiles(lookup)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: items.into_iter().map(ProfileView::from_item).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(in crate::api) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileDetail>>, ApiError> {
    let item = state
        .tapestry
        .get_profile(&username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    let extraction = fairscore::extract(item.profile.bio.as_deref());
    let fresh = fairscore::is_fresh_within(extraction.cached_score.as_ref(), state.score_max_age);

    Ok(Json(ApiResponse {
        data: ProfileDetail {
            fair_score: extraction.cached_score.map(|c| c.score),
            fair_score_captured_at: extraction.cached_score.map(|c| c.captured_at),
            fair_score_fresh: fresh,
            profile: ProfileView::from_item(item),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateProfileBody {
    username: String,
    wallet_address: String,
    bio: Option<String>,
    image: Option<String>,
}

pub(in crate::api) async fn create_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProfileBody>,
) -> Result<Json<ApiResponse<ProfileView>>, ApiError> {
    let clean_bio = body.bio.unwrap_or_default();

    // Seed the bio with the wallet's current score. A reputation outage must
    // not block signup, so a failed lookup just skips the cache.
    let bio = match state.fairscale.get_fair_score(&body.wallet_address).await {
        Ok(score) => fairscore::pack(&clean_bio, score.unwrap_or(0)),
        Err(e) => {
            tracing::warn!(error = %e, "fairscore lookup failed during profile creation");
            clean_bio
        }
    };

    let item = state
        .tapestry
        .create_profile(&CreateProfileRequest {
            username: body.username,
            owner_wallet_address: body.wallet_address,
            bio: (!bio.is_empty()).then_some(bio),
            image: body.image,
        })
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProfileView::from_item(item),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateProfileBody {
    username: Option<String>,
    bio: Option<String>,
    image: Option<String>,
}

/// The update response carries no wallet or counters; keep it narrow.
#[derive(Debug, Serialize)]
pub(in crate::api) struct UpdatedProfileView {
    pub id: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
}

pub(in crate::api) async fn update_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<ApiResponse<UpdatedProfileView>>, ApiError> {
    let current = state
        .tapestry
        .get_profile(&username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;
    let extraction = fairscore::extract(current.profile.bio.as_deref());

    let clean_bio = body.bio.unwrap_or(extraction.clean_bio);
    // A previously cached score survives a bio edit: re-pack it over the new
    // clean text, with a fresh capture instant.
    let bio_to_save = match extraction.cached_score {
        Some(cached) => fairscore::pack(&clean_bio, cached.score),
        None => clean_bio,
    };

    let updated = state
        .tapestry
        .update_profile(
            &username,
            &UpdateProfileRequest {
                username: body.username,
                bio: Some(bio_to_save),
                image: body.image,
            },
        )
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    let extraction = fairscore::extract(updated.bio.as_deref());
    Ok(Json(ApiResponse {
        data: UpdatedProfileView {
            id: updated.id,
            username: updated.username,
            bio: extraction.clean_bio,
            image: updated.image,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct FairScoreStatus {
    pub score: i64,
    pub captured_at: Option<DateTime<Utc>>,
    /// `"cache"` when the packed bio answered, `"live"` after a re-fetch.
    pub source: &'static str,
}

pub(in crate::api) async fn get_profile_fairscore(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<FairScoreStatus>>, ApiError> {
    let item = state
        .tapestry
        .get_profile(&username)
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;
    let extraction = fairscore::extract(item.profile.bio.as_deref());

    if let Some(cached) = extraction.cached_score {
        if fairscore::is_fresh_within(Some(&cached), state.score_max_age) {
            return Ok(Json(ApiResponse {
                data: FairScoreStatus {
                    score: cached.score,
                    captured_at: Some(cached.captured_at),
                    source: "cache",
                },
                meta: ResponseMeta::new(req_id.0),
            }));
        }
    }

    let Some(wallet) = item.wallet.map(|w| w.address) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "profile has no linked wallet",
        ));
    };

    let score = state
        .fairscale
        .get_fair_score(&wallet)
        .await
        .map_err(|e| map_fairscale_error(req_id.0.clone(), &e))?
        .unwrap_or(0);

    // Persist the refreshed cache the same way a profile save would.
    let packed = fairscore::pack(&extraction.clean_bio, score);
    let refreshed = fairscore::extract(Some(&packed)).cached_score;
    state
        .tapestry
        .update_profile(
            &username,
            &UpdateProfileRequest {
                username: None,
                bio: Some(packed),
                image: None,
            },
        )
        .await
        .map_err(|e| map_tapestry_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FairScoreStatus {
            score,
            captured_at: refreshed.map(|c| c.captured_at),
            source: "live",
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
