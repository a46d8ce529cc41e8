pub mod events;
pub mod pages;
pub mod routes;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::consent::{self, ConsentCookie};
use crate::error::AppError;

#[derive(Template)]
#[template(path = "site/not_found.html")]
struct NotFoundTemplate {
    show_consent_banner: bool,
    message: String,
}

/// Attaches a cookie-clearing header when the request carried an unreadable
/// consent cookie.
pub(crate) fn with_consent_cleanup(consent: ConsentCookie, body: impl IntoResponse) -> Response {
    if consent == ConsentCookie::Invalid {
        ([(header::SET_COOKIE, consent::clear_cookie())], body).into_response()
    } else {
        body.into_response()
    }
}

pub(crate) fn not_found(consent: ConsentCookie, message: &str) -> Result<Response, AppError> {
    let html = NotFoundTemplate {
        show_consent_banner: !consent.has_consent(),
        message: message.to_string(),
    }
    .render()?;
    Ok(with_consent_cleanup(consent, (StatusCode::NOT_FOUND, Html(html))))
}
