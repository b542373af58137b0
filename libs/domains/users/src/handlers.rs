use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestIdentityResponse, BadRequestValidationResponse, ConflictResponse,
        GatewayTimeoutResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse,
    },
};
use database::OperationScope;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{ListParams, NewUser, Pagination, UpdateUser, UserPage, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        count_users,
        get_user_by_email,
        get_user,
        update_user,
        delete_user,
    ),
    components(
        schemas(UserResponse, NewUser, UpdateUser, UserPage, Pagination),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdentityResponse,
            ConflictResponse,
            ServiceUnavailableResponse,
            GatewayTimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Service plus the scope every request derives its [`database::OperationContext`] from.
pub struct UsersState<R: UserRepository> {
    pub service: UserService<R>,
    pub scope: OperationScope,
}

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>, scope: OperationScope) -> Router {
    let state = Arc::new(UsersState { service, scope });

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/count", get(count_users))
        .route("/email/{email}", get(get_user_by_email))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(state)
}

/// List users, one page at a time, ordered by id
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(ListParams),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Query(params): Query<ListParams>,
) -> UserResult<Json<UserPage>> {
    let ctx = state.scope.begin();
    let (users, pagination) = state
        .service
        .list(
            &ctx,
            params.page.unwrap_or_default(),
            params.limit.unwrap_or_default(),
        )
        .await?;

    Ok(Json(UserPage {
        data: users.into_iter().map(UserResponse::from).collect(),
        pagination,
    }))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    ValidatedJson(input): ValidatedJson<NewUser>,
) -> UserResult<impl IntoResponse> {
    let ctx = state.scope.begin();
    let user = state.service.create(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Count all users
#[utoipa::path(
    get,
    path = "/count",
    tag = "Users",
    responses(
        (status = 200, description = "Number of users", body = u64),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_users<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
) -> UserResult<Json<u64>> {
    let ctx = state.scope.begin();
    let count = state.service.count(&ctx).await?;
    Ok(Json(count))
}

/// Get a user by exact email
#[utoipa::path(
    get,
    path = "/email/{email}",
    tag = "Users",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user_by_email<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    let ctx = state.scope.begin();
    let user = state.service.get_by_email(&ctx, &email).await?;
    Ok(Json(user.into()))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex)")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestIdentityResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Path(id): Path<String>,
) -> UserResult<Json<UserResponse>> {
    let ctx = state.scope.begin();
    let user = state.service.get_by_id(&ctx, &id).await?;
    Ok(Json(user.into()))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex)")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserResponse>> {
    let ctx = state.scope.begin();
    let user = state.service.update(&ctx, &id, input).await?;
    Ok(Json(user.into()))
}

/// Delete a user. Deleting an unknown id still answers 204.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex)")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, response = BadRequestIdentityResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(state): State<Arc<UsersState<R>>>,
    Path(id): Path<String>,
) -> UserResult<StatusCode> {
    let ctx = state.scope.begin();
    state.service.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
