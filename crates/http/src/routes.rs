//! Handlers for the book service endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::store::{BookInput, StubState};

pub type SharedState = Arc<StubState>;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Routes mounted under `/api`.
pub fn api_routes(state: SharedState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .with_state(state)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, AppError> {
    let token = state.login(&body.username, &body.password).await?;
    tracing::info!(username = %body.username, "admin token issued");
    Ok(Json(json!({ "success": true, "token": token })))
}

async fn list_books(State(state): State<SharedState>) -> Json<Value> {
    let books = state.list().await;
    Json(json!({ "success": true, "count": books.len(), "data": books }))
}

async fn create_book(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<BookInput>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.authorize(bearer(&headers)).await?;
    let book = state.create(input).await?;
    tracing::info!(id = %book.id, "book created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": book })),
    ))
}

async fn update_book(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<BookInput>,
) -> Result<Json<Value>, AppError> {
    state.authorize(bearer(&headers)).await?;
    let book = state.update(&id, input).await?;
    tracing::info!(%id, "book updated");
    Ok(Json(json!({ "success": true, "data": book })))
}

async fn delete_book(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.authorize(bearer(&headers)).await?;
    state.delete(&id).await?;
    tracing::info!(%id, "book deleted");
    Ok(Json(json!({ "success": true, "message": "Book deleted" })))
}
