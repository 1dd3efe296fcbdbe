use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::error::AppError;
use crate::pages::{render_index, render_results};
use crate::report::ThreadRecord;
use crate::thread_url::is_thread_url;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<Analyzer>,
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_index).post(handle_submit))
        .route("/api/analyze", post(handle_analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    #[serde(default)]
    reddit_url: Option<String>,
    #[serde(default)]
    comment_limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    reddit_url: String,
    #[serde(default)]
    comment_limit: Option<usize>,
    #[serde(default)]
    summary_model: Option<String>,
    #[serde(default)]
    relevance_model: Option<String>,
}

/// Checks the URL against the thread pattern and the limit against `1..=max_limit`.
fn validate_input(
    url: Option<&str>,
    limit: Option<&str>,
    config: &Config,
) -> Result<(String, usize), String> {
    let url = url.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err("Reddit URL is required.".to_string());
    }
    if !is_thread_url(url) {
        return Err(
            "Please enter a valid Reddit thread URL (https://www.reddit.com/r/<subreddit>/comments/<id>/...)."
                .to_string(),
        );
    }

    let max = config.analysis.max_comment_limit;
    let limit = match limit.map(str::trim).filter(|l| !l.is_empty()) {
        None => config.analysis.default_comment_limit,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if (1..=max).contains(&n) => n,
            _ => {
                return Err(format!(
                    "Comment limit must be a whole number between 1 and {}.",
                    max
                ))
            }
        },
    };

    Ok((url.to_string(), limit))
}

async fn handle_index(State(state): State<SharedState>) -> Html<String> {
    let analysis = &state.config.analysis;
    Html(render_index(
        None,
        "",
        analysis.default_comment_limit,
        analysis.max_comment_limit,
    ))
}

#[instrument(skip(state))]
async fn handle_submit(
    State(state): State<SharedState>,
    Form(form): Form<AnalyzeForm>,
) -> Response {
    let analysis = &state.config.analysis;
    let submitted_url = form.reddit_url.clone().unwrap_or_default();

    let (url, limit) = match validate_input(
        form.reddit_url.as_deref(),
        form.comment_limit.as_deref(),
        &state.config,
    ) {
        Ok(valid) => valid,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Html(render_index(
                    Some(&message),
                    &submitted_url,
                    analysis.default_comment_limit,
                    analysis.max_comment_limit,
                )),
            )
                .into_response();
        }
    };

    info!("Received request to analyze URL: {}", url);

    match state.analyzer.process_default(&url, limit).await {
        Ok(record) => {
            info!(
                comments = record.comments.len(),
                "Successfully processed data for URL: {}", url
            );
            Html(render_results(&record)).into_response()
        }
        Err(err) => {
            error!(error = %err, "Failed to process data for URL: {}", url);
            let message = format!("Failed to process Reddit thread: {}", err);
            (
                err.status_code(),
                Html(render_index(
                    Some(&message),
                    &url,
                    limit,
                    analysis.max_comment_limit,
                )),
            )
                .into_response()
        }
    }
}

#[instrument(skip(state))]
async fn handle_analyze(
    State(state): State<SharedState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<ThreadRecord>, AppError> {
    let limit = request.comment_limit.map(|n| n.to_string());
    let (url, limit) = validate_input(Some(&request.reddit_url), limit.as_deref(), &state.config)
        .map_err(AppError::InvalidRequest)?;

    let llm = &state.config.llm;
    let summary_model = request.summary_model.as_deref().unwrap_or(&llm.summary_model);
    let relevance_model = request
        .relevance_model
        .as_deref()
        .unwrap_or(&llm.relevance_model);

    let record = state
        .analyzer
        .process(&url, limit, summary_model, relevance_model)
        .await?;
    Ok(Json(record))
}
