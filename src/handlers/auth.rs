use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::issue_token,
    error::{ApiError, ApiResult, ErrorBody, conflict_on_unique},
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, User, UserRef},
    password::{hash_password, verify_password},
    validation::ValidatedJson,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_TAKEN: &str = "Email is already registered";

fn auth_response(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    // An unknown stored role never grants more than a regular user.
    let role = Role::try_from(user.role).unwrap_or_else(|e| {
        tracing::warn!(user_id = user.id, role = user.role, error = %e, "unrecognised role, issuing user token");
        Role::User
    });
    let issued = issue_token(user.id, role, &state.config.token_secret)?;
    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserRef {
            id: user.id,
            name: user.name.clone(),
        },
    })
}

/// login
///
/// Exchanges email and password for a 24-hour bearer token. Unknown email and
/// wrong password give the same 400 so the endpoint does not reveal which
/// accounts exist.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid input or credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let Some(user) = state.repo.find_user_by_email(&payload.email).await? else {
        tracing::info!("login failed: unknown email");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&payload.password, &user.password)? {
        tracing::info!(user_id = user.id, "login failed: wrong password");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(auth_response(&state, &user)?))
}

/// register
///
/// Creates a regular user and logs them in. Admins are never created through
/// this endpoint.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email taken", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if state.repo.find_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::Conflict(EMAIL_TAKEN));
    }

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        password: hash_password(&payload.password)?,
        role: Role::User,
    };

    // The unique index still guards against a concurrent registration.
    let user = state
        .repo
        .create_user(new_user)
        .await
        .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(Json(auth_response(&state, &user)?))
}
