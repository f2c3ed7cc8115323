use axum::{extract::State, routing::post, Json, Router};
use tracing::{error, info, instrument, warn};

use crate::{
    error::UserError,
    state::AppState,
    users::{
        dto::{
            CreateRequest, CreateResponse, DeleteRequest, Empty, GetRequest, GetResponse,
            UpdateRequest,
        },
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user_v1/create", post(create))
        .route("/user_v1/update", post(update))
        .route("/user_v1/delete", post(delete))
        .route("/user_v1/get", post(get))
}

fn report(op: &'static str) -> impl Fn(UserError) -> UserError {
    move |e| {
        if e.status().is_server_error() {
            error!(
                op,
                code = e.code(),
                retryable = e.is_retryable(),
                error = %e,
                "user operation failed"
            );
        } else {
            warn!(op, code = e.code(), error = %e, "user operation rejected");
        }
        e
    }
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, UserError> {
    let email = payload.email.clone();
    let id = services::create_user(state.users.as_ref(), payload)
        .await
        .map_err(report("create"))?;

    info!(user_id = id, %email, "user created");
    Ok(Json(CreateResponse { id }))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<Empty>, UserError> {
    let id = payload.id;
    services::update_user(state.users.as_ref(), payload)
        .await
        .map_err(report("update"))?;

    info!(user_id = id, "user updated");
    Ok(Json(Empty::default()))
}

#[instrument(skip(state, payload))]
pub async fn delete(
    State(state): State<AppState>,
    Json(payload): Json<DeleteRequest>,
) -> Result<Json<Empty>, UserError> {
    services::delete_user(state.users.as_ref(), payload.id)
        .await
        .map_err(report("delete"))?;

    info!(user_id = payload.id, "user marked deleted");
    Ok(Json(Empty::default()))
}

#[instrument(skip(state, payload))]
pub async fn get(
    State(state): State<AppState>,
    Json(payload): Json<GetRequest>,
) -> Result<Json<GetResponse>, UserError> {
    let user = services::get_user(state.users.as_ref(), payload.id)
        .await
        .map_err(report("get"))?;

    Ok(Json(user.into()))
}
