//! Auth route: cookie-backed guest identity.
//!
//! There are no passwords. `POST /api/user/auth` returns the user named by
//! the `userID` cookie, creating a guest (and setting the cookie) when the
//! cookie is missing or points at an unknown user. The websocket route
//! requires the same cookie through the `CookieUser` extractor.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::services::users::{User, UserStore, UserStoreError};
use crate::state::AppState;

pub const USER_COOKIE: &str = "userID";

/// Parse the user id out of the `userID` cookie, if present and well formed.
pub(crate) fn user_id_from_jar(jar: &CookieJar) -> Option<Uuid> {
    jar.get(USER_COOKIE).and_then(|c| Uuid::parse_str(c.value()).ok())
}

fn user_cookie(state: &AppState, user_id: Uuid) -> Cookie<'static> {
    Cookie::build((USER_COOKIE, user_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::days(state.config.user_cookie_days))
        .build()
}

async fn lookup(users: &dyn UserStore, jar: &CookieJar) -> Result<Option<User>, UserStoreError> {
    match user_id_from_jar(jar) {
        Some(id) => users.get(id).await,
        None => Ok(None),
    }
}

fn store_failure(e: &UserStoreError) -> Response {
    error!(code = e.error_code(), retryable = e.retryable(), error = %e, "auth: user store failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "user store error").into_response()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// User resolved from the `userID` cookie. Rejects with 401 when missing.
pub struct CookieUser(pub User);

impl<S> axum::extract::FromRequestParts<S> for CookieUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let app_state = AppState::from_ref(state);
        match lookup(app_state.users.as_ref(), &jar).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => Err((StatusCode::UNAUTHORIZED, "unknown user").into_response()),
            Err(e) => Err(store_failure(&e)),
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/user/auth`: return the cookie user, creating a guest if needed.
pub async fn auth(State(state): State<AppState>, jar: CookieJar) -> Response {
    match lookup(state.users.as_ref(), &jar).await {
        Ok(Some(user)) => {
            // Refresh expiry on every visit.
            let jar = jar.add(user_cookie(&state, user.id));
            (jar, Json(user)).into_response()
        }
        Ok(None) => {
            let user = User::guest();
            if let Err(e) = state.users.create(&user).await {
                return store_failure(&e);
            }
            info!(user_id = %user.id, username = %user.name, "auth: guest created");
            let jar = jar.add(user_cookie(&state, user.id));
            (jar, Json(user)).into_response()
        }
        Err(e) => store_failure(&e),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
