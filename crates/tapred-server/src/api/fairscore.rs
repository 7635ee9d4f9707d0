//! Direct FairScore proxy, for callers that hold a wallet address.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_fairscale_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct FairScoreQuery {
    wallet: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct FairScoreItem {
    /// The upstream score verbatim; `null` for never-scored wallets.
    pub fair_score: Option<i64>,
}

pub(in crate::api) async fn get_fairscore(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FairScoreQuery>,
) -> Result<Json<ApiResponse<FairScoreItem>>, ApiError> {
    let Some(wallet) = query.wallet else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "wallet parameter is required",
        ));
    };

    let fair_score = state
        .fairscale
        .get_fair_score(&wallet)
        .await
        .map_err(|e| map_fairscale_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: FairScoreItem { fair_score },
        meta: ResponseMeta::new(req_id.0),
    }))
}
