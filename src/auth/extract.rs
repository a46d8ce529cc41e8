use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;

use crate::admin::session::SESSION_COOKIE_NAME;
use crate::cookies::cookie_value;
use crate::state::AppState;

/// An admin with a live session. Anyone else is sent to the login page.
pub struct AdminUser {
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, SESSION_COOKIE_NAME)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Redirect::to("/admin/login"))?;

        let sessions = state.sessions.lock().await;
        let session = sessions
            .get(token)
            .ok_or_else(|| Redirect::to("/admin/login"))?;

        Ok(AdminUser {
            email: session.email.clone(),
        })
    }
}
