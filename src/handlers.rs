// src/handlers.rs
use std::sync::Arc;

use serde_json::json;
use warp::{http::StatusCode, Rejection, Reply};
use warp::reply::Response;

use crate::database::JobCache;
use crate::error::RecommendError;
use crate::models::{RecommendationRequest, RecommendationResponse};
use crate::recommender::Recommender;

pub async fn recommendations_handler(
    request: RecommendationRequest,
    recommender: Arc<Recommender>,
) -> Result<Response, Rejection> {
    let filters = request.filters.unwrap_or_default();
    match recommender.recommend(&request.user_profile, &filters).await {
        Ok((recommendations, total)) => {
            let body = RecommendationResponse {
                recommendations,
                total,
                page: filters.page(),
                per_page: filters.per_page,
            };
            Ok(warp::reply::json(&body).into_response())
        }
        Err(RecommendError::Validation(detail)) => Ok(warp::reply::with_status(
            warp::reply::json(&json!({ "detail": detail })),
            StatusCode::BAD_REQUEST,
        )
        .into_response()),
        Err(RecommendError::Internal(e)) => {
            // Never leak internals to the caller.
            tracing::error!(error = ?e, "recommendation error");
            Ok(warp::reply::with_status(
                warp::reply::json(&json!({ "detail": "Processing error" })),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response())
        }
    }
}

pub async fn health_handler(cache: Arc<dyn JobCache>) -> Result<Response, Rejection> {
    let cache_connected = cache.ping().await;
    let status = if cache_connected { "healthy" } else { "unhealthy" };
    Ok(warp::reply::json(&json!({
        "status": status,
        "cache_connected": cache_connected,
    }))
    .into_response())
}
