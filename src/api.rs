#![forbid(unsafe_code)]

//! HTTP surface: the embedded frontend page and `GET /api/videos`.
//!
//! The catalog pipeline blocks on upstream calls, so each request hands it to
//! the blocking pool and the runtime keeps serving other requests meanwhile.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{debug, error};
use serde::Serialize;

use crate::catalog::fetch_channel_videos;
use crate::config::{API_KEY_VAR, RuntimeSettings};
use crate::error::FetchError;
use crate::filter::{Category, VideoResult};
use crate::youtube::{VideoPlatform, YouTubeClient};

const INDEX_HTML: &str = include_str!("../static/index.html");
const GENERIC_ERROR: &str = "Something went wrong.";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured.
    pub platform: Option<Arc<dyn VideoPlatform>>,
}

impl AppState {
    pub fn from_settings(settings: &RuntimeSettings) -> Self {
        let platform = settings.youtube_api_key.as_ref().map(|key| {
            Arc::new(YouTubeClient::new(
                key.clone(),
                &settings.api_base_url,
                settings.upstream_timeout,
            )) as Arc<dyn VideoPlatform>
        });
        Self { platform }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates a 400 error with the provided message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 error with the provided message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 error with the provided message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_ERROR.to_string()
        } else {
            message
        };
        Self { status, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default)]
pub struct VideosQuery {
    pub channel_url: Option<String>,
    pub category: Option<String>,
}

impl VideosQuery {
    /// Keeps the first value of each known key, so repeated keys never fail
    /// the request.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "channelUrl" => &mut query.channel_url,
                "type" => &mut query.category,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<VideoResult>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .nest(
            "/api",
            Router::new()
                .route("/videos", get(list_channel_videos))
                .fallback(not_found),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}

async fn list_channel_videos(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<VideosResponse>> {
    let query = match query {
        Ok(Query(pairs)) => VideosQuery::from_pairs(pairs),
        Err(rejection) => {
            error!("Ignoring unreadable video query: {rejection}");
            VideosQuery::default()
        }
    };

    let channel_url = query
        .channel_url
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("channelUrl query parameter is required."))?;
    let platform = state.platform.clone().ok_or_else(|| {
        error!("Rejecting video request: {API_KEY_VAR} is not set");
        ApiError::internal(format!("{API_KEY_VAR} is not configured on the server."))
    })?;
    let category = query
        .category
        .as_deref()
        .map(Category::from_param)
        .unwrap_or_default();

    let lookup_url = channel_url.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        fetch_channel_videos(platform.as_ref(), &lookup_url, category)
    })
    .await;

    match outcome {
        Ok(Ok(videos)) => {
            debug!("Returning {} videos for {channel_url}", videos.len());
            Ok(Json(VideosResponse { videos }))
        }
        Ok(Err(err)) => {
            error!("Failed to list videos for {channel_url}: {err:?}");
            Err(err.into())
        }
        Err(err) => {
            error!("Video lookup task for {channel_url} did not complete: {err}");
            Err(ApiError::internal(GENERIC_ERROR))
        }
    }
}
