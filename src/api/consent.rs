use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::consent::{self, ConsentCookie, ConsentPreferences};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentResponse {
    has_consent: bool,
    analytics: bool,
    marketing: bool,
    preferences: Option<ConsentPreferences>,
}

impl ConsentResponse {
    fn from_cookie(cookie: ConsentCookie) -> Self {
        ConsentResponse {
            has_consent: cookie.has_consent(),
            analytics: cookie.has_analytics_consent(),
            marketing: cookie.has_marketing_consent(),
            preferences: cookie.preferences(),
        }
    }
}

fn save(state: &AppState, preferences: ConsentPreferences) -> Result<Response, AppError> {
    let preferences = preferences.normalized();
    let cookie = consent::set_cookie(preferences, Utc::now(), state.secure_cookies)?;
    let body = ConsentResponse::from_cookie(ConsentCookie::Valid(preferences));
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn get_consent(headers: HeaderMap) -> Response {
    let current = consent::read(&headers);
    let body = Json(ConsentResponse::from_cookie(current));
    if current == ConsentCookie::Invalid {
        ([(header::SET_COOKIE, consent::clear_cookie())], body).into_response()
    } else {
        body.into_response()
    }
}

pub async fn set_consent(
    State(state): State<Arc<AppState>>,
    Json(preferences): Json<ConsentPreferences>,
) -> Result<Response, AppError> {
    save(&state, preferences)
}

pub async fn accept_all(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    save(&state, ConsentPreferences::accept_all())
}

pub async fn reject_all(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    save(&state, ConsentPreferences::necessary_only())
}

pub async fn clear_consent() -> Response {
    let body = Json(ConsentResponse::from_cookie(ConsentCookie::Missing));
    ([(header::SET_COOKIE, consent::clear_cookie())], body).into_response()
}
