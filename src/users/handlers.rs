use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{authorize, AuthApp, Permission},
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

use super::dto::{NewUser, Pagination, UserChanges, UserView};
use super::services;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(post_user))
        .route("/users/:id", get(get_user).put(put_user).delete(delete_user))
}

#[instrument(skip(state, caller), fields(app_id = %caller.app_id))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthApp,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<UserView>>> {
    authorize(&caller, Permission::ListUsers, None)?;
    let (limit, offset) = p.clamped();
    let users = state.users.list_by_app(caller.app_id, limit, offset).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

#[instrument(skip(state, caller, payload), fields(app_id = %caller.app_id))]
pub async fn post_user(
    State(state): State<AppState>,
    caller: AuthApp,
    JsonBody(payload): JsonBody<NewUser>,
) -> AppResult<(StatusCode, HeaderMap, Json<UserView>)> {
    authorize(&caller, Permission::PostUsers, None)?;
    let user = services::create_user(state.users.as_ref(), caller.app_id, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/users/{}", user.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(user.into())))
}

#[instrument(skip(state, caller), fields(app_id = %caller.app_id))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthApp,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserView>> {
    let user = services::get_user(state.users.as_ref(), id).await?;
    authorize(&caller, Permission::GetUsers, Some(&user))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller, payload), fields(app_id = %caller.app_id))]
pub async fn put_user(
    State(state): State<AppState>,
    caller: AuthApp,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UserChanges>,
) -> AppResult<Json<UserView>> {
    let user = services::get_user(state.users.as_ref(), id).await?;
    authorize(&caller, Permission::PutUsers, Some(&user))?;
    let user = services::update_user(state.users.as_ref(), user, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller), fields(app_id = %caller.app_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthApp,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user = services::get_user(state.users.as_ref(), id).await?;
    authorize(&caller, Permission::DeleteUsers, Some(&user))?;
    services::soft_delete_user(state.users.as_ref(), user).await?;
    info!(user_id = %id, "delete accepted");
    Ok(StatusCode::NO_CONTENT)
}
